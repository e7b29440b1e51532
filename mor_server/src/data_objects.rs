use std::fmt::Display;

use mor_engine::PayoutOutcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentMethodsRequest {
    #[serde(default)]
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletsRequest {
    #[serde(default)]
    pub currency_codes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayoutToWalletRequest {
    #[serde(default)]
    pub account_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutResponse {
    pub outcome: PayoutOutcome,
    pub message: String,
}

impl From<PayoutOutcome> for PayoutResponse {
    fn from(outcome: PayoutOutcome) -> Self {
        Self { outcome, message: outcome.message().to_string() }
    }
}

/// Free-text search for the customers list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerQuery {
    pub search: Option<String>,
}
