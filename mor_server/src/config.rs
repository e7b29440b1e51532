use std::env;

use chrono::Duration;
use log::*;
use mor_common::Secret;
use mor_engine::{
    gateway::GatewayConfig,
    mor_api::{enrichment::DEFAULT_ENRICHMENT_CONCURRENCY, payout_api::DEFAULT_BULK_PAYOUT_THRESHOLD},
};

const DEFAULT_MOR_HOST: &str = "127.0.0.1";
const DEFAULT_MOR_PORT: u16 = 8470;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/mor_store.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The maximum number of downstream lookups in flight while enriching a single list of records.
    pub enrichment_concurrency: usize,
    /// Bulk payouts for at least this many merchants run in the background.
    pub bulk_payout_threshold: usize,
    /// How often the payout worker pays out every merchant. `None` disables the worker.
    pub payout_interval: Option<Duration>,
    /// When set, Flutterwave webhooks must carry this value in their `verif-hash` header.
    pub flutterwave_secret_hash: Option<Secret<String>>,
    pub gateway: GatewayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MOR_HOST.to_string(),
            port: DEFAULT_MOR_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            enrichment_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY,
            bulk_payout_threshold: DEFAULT_BULK_PAYOUT_THRESHOLD,
            payout_interval: None,
            flutterwave_secret_hash: None,
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MOR_HOST").ok().unwrap_or_else(|| DEFAULT_MOR_HOST.into());
        let port = parse_env("MOR_PORT", DEFAULT_MOR_PORT);
        let database_url = env::var("MOR_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MOR_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let enrichment_concurrency = parse_env("MOR_ENRICHMENT_CONCURRENCY", DEFAULT_ENRICHMENT_CONCURRENCY).max(1);
        let bulk_payout_threshold = parse_env("MOR_BULK_PAYOUT_THRESHOLD", DEFAULT_BULK_PAYOUT_THRESHOLD).max(1);
        let payout_interval = payout_interval(parse_env("MOR_PAYOUT_INTERVAL_HOURS", 0));
        let flutterwave_secret_hash =
            env::var("MOR_FLUTTERWAVE_SECRET_HASH").ok().filter(|s| !s.trim().is_empty()).map(Secret::new).or_else(
                || {
                    warn!("🪛️ MOR_FLUTTERWAVE_SECRET_HASH is not set. Flutterwave webhooks will not be verified.");
                    None
                },
            );
        let gateway = GatewayConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            enrichment_concurrency,
            bulk_payout_threshold,
            payout_interval,
            flutterwave_secret_hash,
            gateway,
        }
    }
}

fn payout_interval(hours: i64) -> Option<Duration> {
    if hours > 0 {
        info!("🪛️ Merchants will be paid out every {hours} hours");
        Some(Duration::hours(hours))
    } else {
        info!("🪛️ MOR_PAYOUT_INTERVAL_HOURS is not set. The payout worker is disabled.");
        None
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}
