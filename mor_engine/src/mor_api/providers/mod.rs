//! Payment provider webhooks.
//!
//! Providers notify a merchant's webhook URL when one of their customers pays. Only Flutterwave payloads are
//! interpreted. Everything else is stored in the webhook log and otherwise ignored.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub mod flutterwave;

/// Header Flutterwave uses to carry the merchant's secret hash.
pub const FLUTTERWAVE_HASH_HEADER: &str = "verif-hash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookProvider {
    /// Flutterwave, known in webhook logs by its legacy name `rave`.
    #[serde(rename = "rave")]
    Flutterwave,
    Default,
}

impl WebhookProvider {
    /// Flutterwave is the only provider that sends a `verif-hash` header.
    pub fn detect(verif_hash: Option<&str>) -> Self {
        match verif_hash {
            Some(h) if !h.trim().is_empty() => Self::Flutterwave,
            _ => Self::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookProvider::Flutterwave => "rave",
            WebhookProvider::Default => "default",
        }
    }
}

impl Display for WebhookProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
