use thiserror::Error;

use crate::gateway::GatewayOperation;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Request data format error for {operation}. {reason}")]
    RequestFormatError { operation: GatewayOperation, reason: String },
    #[error("Unknown gateway operation: {0}")]
    OperationNotFound(String),
    #[error("Could not reach the downstream service. {0}")]
    Transport(String),
    #[error("Downstream service responded with status {status}. {message}")]
    Downstream { status: u16, message: String },
    #[error("{0} was not found")]
    NotFound(String),
    #[error("Could not deserialize the downstream response. {0}")]
    Deserialization(String),
    #[error("Could not initialize the gateway. {0}")]
    Initialization(String),
}

impl GatewayError {
    pub fn format_error<S: Into<String>>(operation: GatewayOperation, reason: S) -> Self {
        Self::RequestFormatError { operation, reason: reason.into() }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::Deserialization(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}
