//! MOR Engine
//!
//! The merchant-of-record engine settles card and mobile payments taken on behalf of merchants. It records merchant
//! transactions, pays them out into per-currency settlement wallets, handles withdrawals from those wallets and keeps
//! each merchant's settings (countries, currencies, payment methods and verification documents).
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@traits`] and [`mod@sqlite`]). The traits describe what each API needs from a database and
//!    `SqliteDatabase` implements all of them. The data types used in the database are in [`mod@db_types`].
//! 2. The [`mod@gateway`] to the sibling services that own users, countries, exchange rates and wallets.
//! 3. The public API ([`mod@mor_api`]). This is what servers and tools should use.
//!
//! The engine also emits [`mod@events`] (a payout was written, a withdrawal was requested) that callers can hook into.
pub mod db_types;
pub mod events;
pub mod gateway;
pub mod mor_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use mor_api::{
    currency_reconciliation::CurrencyReconciler,
    customers_api::CustomersApi,
    errors::MorApiError,
    payout_api::{PayoutApi, PayoutOutcome},
    principal::{Principal, Role},
    settings_api::SettingsApi,
    transactions_api::TransactionsApi,
    webhooks_api::WebhooksApi,
    withdrawal_api::WithdrawalApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CustomerManagement,
    MorDatabase,
    PayoutManagement,
    SettingsManagement,
    StorageError,
    TransactionManagement,
    WebhookLogManagement,
    WithdrawalManagement,
};
