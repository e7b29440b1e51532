mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use helpers::{mor_wallet, normalize_currency, strip_wallet_prefix, MOR_WALLET_PREFIX, USD};
pub use money::{Money, MoneyConversionError, MONEY_EPSILON};
pub use secret::Secret;
