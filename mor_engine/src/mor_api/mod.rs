//! # MOR engine public API
//!
//! The `mor_api` module exposes the programmatic API of the merchant-of-record engine. Each concern has its own API
//! object, so that callers only need a backend that implements the storage traits that concern uses.
//!
//! * [`settings_api`] manages a merchant's countries, settlement currencies, payment methods and verification
//!   documents. Currency changes go through [`currency_reconciliation`].
//! * [`payout_api`] turns unpaid transactions into payouts credited to the merchants' settlement wallets.
//! * [`transactions_api`] records and queries merchant transactions.
//! * [`withdrawal_api`] handles withdrawal requests against settlement wallets.
//! * [`customers_api`] and [`webhooks_api`] track the customers that pay merchants, as reported by payment providers.
//!
//! List results are decorated with merchant and currency details by the [`enrichment`] helpers.
//!
//! # API usage
//!
//! Every API is created from a storage backend and, where needed, an [`ExternalGateway`]:
//!
//! ```rust,ignore
//! use mor_engine::{gateway::HttpGateway, PayoutApi, SqliteDatabase};
//! let db = SqliteDatabase::new(25).await?;
//! let gateway = HttpGateway::new(GatewayConfig::new_from_env_or_default())?;
//! let api = PayoutApi::new(db, gateway, EventProducers::default());
//! let payouts = api.payout_merchant(account_id).await?;
//! ```
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::*;
use mor_common::normalize_currency;

use crate::{gateway::ExternalGateway, mor_api::errors::MorApiError};

pub mod currency_reconciliation;
pub mod customers_api;
pub mod detail_objects;
pub mod enrichment;
pub mod errors;
pub mod payout_api;
pub mod principal;
pub mod providers;
pub mod query_objects;
pub mod settings_api;
pub mod transactions_api;
pub mod webhooks_api;
pub mod withdrawal_api;

/// How a caller-supplied currency filter narrows a search on country id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CountryMatch {
    /// No currency filter was given.
    Any,
    Country(i64),
    /// The currency is unknown, so nothing can match.
    Nothing,
}

pub(crate) async fn country_filter<G: ExternalGateway>(gateway: &G, currency: Option<&str>) -> CountryMatch {
    let code = match currency.map(normalize_currency).filter(|c| !c.is_empty()) {
        Some(c) => c,
        None => return CountryMatch::Any,
    };
    match gateway.get_country_by_currency(&code).await {
        Ok(country) => CountryMatch::Country(country.id),
        Err(e) => {
            debug!("🔍️ No country uses {code}, so nothing matches. {e}");
            CountryMatch::Nothing
        },
    }
}

/// Converts unix seconds to a timestamp no later than `max_ahead` from now. Zero means now.
pub(crate) fn timestamp_or_now(seconds: i64, max_ahead: Duration) -> Result<DateTime<Utc>, MorApiError> {
    let now = Utc::now();
    if seconds == 0 {
        return Ok(now);
    }
    let timestamp = match Utc.timestamp_opt(seconds, 0).single() {
        Some(t) if seconds > 0 => t,
        _ => return Err(MorApiError::validation(format!("{seconds} is not a valid timestamp"))),
    };
    if timestamp > now + max_ahead {
        return Err(MorApiError::validation(format!(
            "invalid timestamp, time must not be more than {} hours from now",
            max_ahead.num_hours()
        )));
    }
    Ok(timestamp)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timestamps() {
        let max = Duration::hours(336);
        let now = Utc::now();
        assert!(timestamp_or_now(0, max).unwrap() >= now);
        let soon = now.timestamp() + 3600;
        assert_eq!(timestamp_or_now(soon, max).unwrap().timestamp(), soon);
        let past = now.timestamp() - 86_400 * 30;
        assert_eq!(timestamp_or_now(past, max).unwrap().timestamp(), past);
        let too_late = now.timestamp() + 337 * 3600;
        assert!(matches!(timestamp_or_now(too_late, max), Err(MorApiError::Validation(_))));
        assert!(matches!(timestamp_or_now(-5, max), Err(MorApiError::Validation(_))));
    }
}
