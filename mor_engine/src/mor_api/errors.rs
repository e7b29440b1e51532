use thiserror::Error;

use crate::{gateway::GatewayError, traits::StorageError};

#[derive(Debug, Clone, Error)]
pub enum MorApiError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid request. {0}")]
    Validation(String),
    #[error("Insufficient balance. Requested {requested} {currency}, but only {available} is available")]
    InsufficientBalance { currency: String, requested: String, available: String },
    #[error("External service error. {0}")]
    Gateway(#[from] GatewayError),
    #[error("Storage error. {0}")]
    Storage(#[from] StorageError),
    #[error("Internal error. {0}")]
    Internal(String),
    #[error("Request could not be authenticated. {0}")]
    Unauthorized(String),
    #[error("Could not update {currency} in the merchant's wallet set. {source}")]
    Reconciliation {
        currency: String,
        /// The merchant's currency set as it stood when the failure happened.
        currencies: Vec<String>,
        #[source]
        source: GatewayError,
    },
}

impl MorApiError {
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation<S: Into<String>>(reason: S) -> Self {
        Self::Validation(reason.into())
    }
}
