use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use mor_engine::MorApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    InsufficientBalance(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientBalance(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("The bearer token is not valid. {0}")]
    InvalidToken(String),
    #[error("The webhook signature is not valid. {0}")]
    InvalidSignature(String),
}

impl From<MorApiError> for ServerError {
    fn from(e: MorApiError) -> Self {
        match e {
            MorApiError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            MorApiError::Validation(_) => Self::ValidationError(e.to_string()),
            MorApiError::InsufficientBalance { .. } => Self::InsufficientBalance(e.to_string()),
            MorApiError::Unauthorized(reason) => Self::AuthenticationError(AuthError::InvalidSignature(reason)),
            MorApiError::Gateway(_) | MorApiError::Storage(_) | MorApiError::Reconciliation { .. } => {
                error!("💻️ Request failed on the backend. {e}");
                Self::BackendError(e.to_string())
            },
            MorApiError::Internal(_) => {
                error!("💻️ Request failed with an internal error. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}
