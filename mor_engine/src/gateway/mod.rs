//! # External Service Gateway
//!
//! Identity, country, exchange-rate and wallet data belong to sibling services. The engine only ever talks to them
//! through [`ExternalGateway`], which has one strongly typed method per [`GatewayOperation`].
//!
//! Every implementation checks its payload before doing any I/O and fails with
//! [`GatewayError::RequestFormatError`] if it is malformed. Downstream failures are passed through unchanged. The
//! gateway never retries; callers that want resilience have to retry themselves.
//!
//! [`HttpGateway`] is the production implementation. The `test_utils` feature provides an in-memory one.
mod config;
mod errors;
mod http;
mod objects;
mod operations;
pub mod validation;

pub use config::GatewayConfig;
pub use errors::GatewayError;
pub use http::{Endpoint, HttpGateway, Service};
use mor_common::Money;
pub use objects::{
    Country,
    ExchangeRate,
    MorStatusUpdate,
    NewExchangeTransaction,
    User,
    UserFilter,
    WalletBalance,
    WalletMutation,
};
pub use operations::GatewayOperation;

#[allow(async_fn_in_trait)]
pub trait ExternalGateway: Clone {
    async fn get_user_with_account_id(&self, account_id: i64) -> Result<User, GatewayError>;

    async fn get_country_by_id(&self, country_id: i64) -> Result<Country, GatewayError>;

    async fn get_country_by_currency(&self, currency_code: &str) -> Result<Country, GatewayError>;

    /// The rate for converting `from` into `to`. A rate with a non-positive id means "no rate".
    async fn get_rate_by_currencies(&self, from: &str, to: &str) -> Result<ExchangeRate, GatewayError>;

    /// `currency` is the full wallet name, e.g. `MOR_EUR`.
    async fn get_wallet_balance_by_account_id_and_currency(
        &self,
        account_id: i64,
        currency: &str,
    ) -> Result<WalletBalance, GatewayError>;

    async fn create_wallet_balance(
        &self,
        account_id: i64,
        currency: &str,
        initial: Money,
    ) -> Result<WalletBalance, GatewayError>;

    /// Returns the wallet balance after the debit.
    async fn debit_wallet(&self, mutation: WalletMutation) -> Result<WalletBalance, GatewayError>;

    /// Returns the wallet balance after the credit.
    async fn credit_wallet(&self, mutation: WalletMutation) -> Result<WalletBalance, GatewayError>;

    async fn create_exchange_transaction(&self, transaction: NewExchangeTransaction) -> Result<(), GatewayError>;

    async fn get_users(&self, filter: UserFilter) -> Result<Vec<User>, GatewayError>;

    /// Resolves a bearer token into the user it was issued to.
    async fn validate_authorization(&self, token: &str) -> Result<User, GatewayError>;

    async fn toggle_mor_status(&self, account_id: i64, enabled: bool) -> Result<(), GatewayError>;
}
