//! # Storage contracts
//!
//! This module defines the behaviour a database backend must expose to act as the store for the MOR engine.
//!
//! * [`SettingsManagement`] stores per-merchant settings: currencies, countries, payment methods and verifications.
//! * [`TransactionManagement`] records merchant sales and answers the "what is still unpaid" questions the payout
//!   engine asks.
//! * [`PayoutManagement`] records payouts. Settling a payout and marking its transactions as paid is a single atomic
//!   operation.
//! * [`WithdrawalManagement`] stores merchant withdrawal requests.
//! * [`CustomerManagement`] and [`WebhookLogManagement`] back the provider webhook flow.
//!
//! [`MorDatabase`] bundles all of the above and is what the public APIs are generic over.
mod customer_management;
mod payout_management;
mod settings_management;
mod transaction_management;
mod webhook_logs;
mod withdrawal_management;

pub use customer_management::CustomerManagement;
pub use payout_management::PayoutManagement;
pub use settings_management::SettingsManagement;
use thiserror::Error;
pub use transaction_management::TransactionManagement;
pub use webhook_logs::WebhookLogManagement;
pub use withdrawal_management::WithdrawalManagement;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
    #[error("The requested record does not exist: {0}")]
    RecordNotFound(String),
    #[error("The operation would violate a database constraint: {0}")]
    ConstraintViolation(String),
    #[error("The transactions have already been claimed by another payout: {0}")]
    AlreadyClaimed(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StorageError::RecordNotFound("no rows returned".into()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
                StorageError::ConstraintViolation(db.message().to_string())
            },
            e => StorageError::DatabaseError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::DatabaseError(format!("Could not (de)serialize a JSON column. {e}"))
    }
}

/// The full set of storage behaviour the MOR engine needs from a backend.
pub trait MorDatabase:
    Clone
    + SettingsManagement
    + TransactionManagement
    + PayoutManagement
    + WithdrawalManagement
    + CustomerManagement
    + WebhookLogManagement
{
}

impl<T> MorDatabase for T where T: Clone
        + SettingsManagement
        + TransactionManagement
        + PayoutManagement
        + WithdrawalManagement
        + CustomerManagement
        + WebhookLogManagement
{
}
