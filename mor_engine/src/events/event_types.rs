use serde::{Deserialize, Serialize};

use crate::db_types::{Payout, Withdrawal};

/// Published for every payout record written, successful or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutCreatedEvent {
    pub payout: Payout,
    pub currency: String,
}

impl PayoutCreatedEvent {
    pub fn new<S: Into<String>>(payout: Payout, currency: S) -> Self {
        Self { payout, currency: currency.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequestedEvent {
    pub withdrawal: Withdrawal,
    pub merchant_email: String,
}

impl WithdrawalRequestedEvent {
    pub fn new<S: Into<String>>(withdrawal: Withdrawal, merchant_email: S) -> Self {
        Self { withdrawal, merchant_email: merchant_email.into() }
    }
}
