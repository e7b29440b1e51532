use log::*;
use mor_common::Secret;

/// Where the sibling services live, and the key the engine identifies itself with.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub auth_service_url: String,
    pub payment_service_url: String,
    pub transactions_service_url: String,
    pub app_key: Secret<String>,
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let auth_service_url = std::env::var("MOR_AUTH_SERVICE_URL").unwrap_or_else(|_| {
            warn!("🪛️ MOR_AUTH_SERVICE_URL not set, using http://localhost:8001 as default");
            "http://localhost:8001".to_string()
        });
        let payment_service_url = std::env::var("MOR_PAYMENT_SERVICE_URL").unwrap_or_else(|_| {
            warn!("🪛️ MOR_PAYMENT_SERVICE_URL not set, using http://localhost:8002 as default");
            "http://localhost:8002".to_string()
        });
        let transactions_service_url = std::env::var("MOR_TRANSACTIONS_SERVICE_URL").unwrap_or_else(|_| {
            warn!("🪛️ MOR_TRANSACTIONS_SERVICE_URL not set, using http://localhost:8003 as default");
            "http://localhost:8003".to_string()
        });
        let app_key = Secret::new(std::env::var("MOR_APP_KEY").unwrap_or_else(|_| {
            warn!("🪛️ MOR_APP_KEY not set. Calls to sibling services will probably be rejected.");
            String::default()
        }));
        Self { auth_service_url, payment_service_url, transactions_service_url, app_key }
    }
}
