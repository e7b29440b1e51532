//! Records decorated with display data held by sibling services.
use mor_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Payout, Setting, Transaction, Withdrawal};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub merchant_name: String,
    pub merchant_email: String,
    pub country: String,
    pub currency: String,
    pub customer_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutDetails {
    #[serde(flatten)]
    pub payout: Payout,
    pub merchant_name: String,
    pub merchant_email: String,
    pub country: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingDetails {
    #[serde(flatten)]
    pub setting: Setting,
    pub email: String,
    pub full_name: String,
    pub account_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalDetails {
    #[serde(flatten)]
    pub withdrawal: Withdrawal,
    pub merchant_name: String,
    pub merchant_email: String,
}

/// Unpaid transaction total for one country, labelled with its currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySummary {
    pub country_id: i64,
    pub currency: String,
    pub amount: Money,
}
