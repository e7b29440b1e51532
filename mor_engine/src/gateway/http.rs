use std::{collections::HashMap, fmt::Debug, sync::Arc};

use log::*;
use mor_common::Money;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::gateway::{
    validation::{
        check_account_id,
        check_currency,
        check_exchange_transaction,
        check_id,
        check_token,
        check_wallet_mutation,
    },
    Country,
    ExchangeRate,
    ExternalGateway,
    GatewayConfig,
    GatewayError,
    GatewayOperation,
    MorStatusUpdate,
    NewExchangeTransaction,
    User,
    UserFilter,
    WalletBalance,
    WalletMutation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Auth,
    Payment,
    Transactions,
}

/// Where an operation is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub service: Service,
    pub method: Method,
    pub path: &'static str,
}

impl Endpoint {
    pub fn new(service: Service, method: Method, path: &'static str) -> Self {
        Self { service, method, path }
    }
}

/// The route table for every gateway operation.
pub fn default_endpoints() -> HashMap<GatewayOperation, Endpoint> {
    use GatewayOperation::*;
    use Service::*;
    [
        (GetUserWithAccountId, Endpoint::new(Auth, Method::POST, "/v2/user/get")),
        (GetCountryById, Endpoint::new(Auth, Method::GET, "/v2/country/by-id")),
        (GetCountryByCurrency, Endpoint::new(Auth, Method::GET, "/v2/country/by-currency")),
        (GetRateByCurrencies, Endpoint::new(Payment, Method::GET, "/v2/rates/by-currencies")),
        (GetWalletBalanceByAccountIdAndCurrency, Endpoint::new(Payment, Method::POST, "/v2/wallet/get")),
        (CreateWalletBalance, Endpoint::new(Payment, Method::POST, "/v2/wallet/create")),
        (DebitWallet, Endpoint::new(Payment, Method::POST, "/v2/wallet/debit")),
        (CreditWallet, Endpoint::new(Payment, Method::POST, "/v2/wallet/credit")),
        (CreateExchangeTransaction, Endpoint::new(Transactions, Method::POST, "/v2/exchange-transaction")),
        (GetUsers, Endpoint::new(Auth, Method::GET, "/v2/users")),
        (ValidateAuthorization, Endpoint::new(Auth, Method::POST, "/v2/validate-authorization")),
        (ToggleMorStatus, Endpoint::new(Auth, Method::PATCH, "/v2/user/mor-status")),
    ]
    .into_iter()
    .collect()
}

/// Sibling services wrap every payload in a `data` field.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Clone)]
pub struct HttpGateway {
    config: GatewayConfig,
    client: Arc<Client>,
    endpoints: Arc<HashMap<GatewayOperation, Endpoint>>,
}

impl Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HttpGateway ({:?}, {} endpoints)", self.config, self.endpoints.len())
    }
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_endpoints(config, default_endpoints())
    }

    /// Builds the gateway with a custom route table. Every [`GatewayOperation`] must have an entry.
    pub fn with_endpoints(
        config: GatewayConfig,
        endpoints: HashMap<GatewayOperation, Endpoint>,
    ) -> Result<Self, GatewayError> {
        let missing = GatewayOperation::ALL
            .iter()
            .filter(|op| !endpoints.contains_key(*op))
            .map(|op| op.to_string())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(GatewayError::Initialization(format!("No endpoint configured for {}", missing.join(", "))));
        }
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.app_key.reveal().as_str())
            .map_err(|e| GatewayError::Initialization(e.to_string()))?;
        headers.insert("v-app", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), endpoints: Arc::new(endpoints) })
    }

    fn endpoint(&self, op: GatewayOperation) -> Result<&Endpoint, GatewayError> {
        self.endpoints.get(&op).ok_or_else(|| GatewayError::OperationNotFound(op.to_string()))
    }

    pub fn url(&self, endpoint: &Endpoint) -> String {
        let base = match endpoint.service {
            Service::Auth => &self.config.auth_service_url,
            Service::Payment => &self.config.payment_service_url,
            Service::Transactions => &self.config.transactions_service_url,
        };
        format!("{}{}", base.trim_end_matches('/'), endpoint.path)
    }

    async fn call<T: DeserializeOwned, B: Serialize>(
        &self,
        op: GatewayOperation,
        params: &[(&str, String)],
        body: Option<B>,
    ) -> Result<T, GatewayError> {
        let endpoint = self.endpoint(op)?;
        let url = self.url(endpoint);
        trace!("🌐️ {op}: {} {url}", endpoint.method);
        let mut req = self.client.request(endpoint.method.clone(), url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;
        read_response(op, status, &body)
    }
}

/// Maps a downstream response onto the gateway's result type. Successful responses carry their payload in a
/// `{"data": ..}` envelope.
pub fn read_response<T: DeserializeOwned>(
    op: GatewayOperation,
    status: StatusCode,
    body: &str,
) -> Result<T, GatewayError> {
    if status.is_success() {
        trace!("🌐️ {op} successful. {status}");
        let envelope = serde_json::from_str::<Envelope<T>>(body)
            .map_err(|e| GatewayError::Deserialization(format!("{op}: {e}")))?;
        Ok(envelope.data)
    } else if status == StatusCode::NOT_FOUND {
        debug!("🌐️ {op} returned 404");
        Err(GatewayError::NotFound(format!("The resource requested by {op}")))
    } else {
        warn!("🌐️ {op} failed with status {status}. {body}");
        Err(GatewayError::Downstream { status: status.as_u16(), message: body.to_string() })
    }
}

impl ExternalGateway for HttpGateway {
    async fn get_user_with_account_id(&self, account_id: i64) -> Result<User, GatewayError> {
        let op = GatewayOperation::GetUserWithAccountId;
        check_account_id(op, account_id)?;
        self.call(op, &[], Some(json!({ "account_id": account_id }))).await
    }

    async fn get_country_by_id(&self, country_id: i64) -> Result<Country, GatewayError> {
        let op = GatewayOperation::GetCountryById;
        check_id(op, country_id)?;
        self.call::<_, ()>(op, &[("id", country_id.to_string())], None).await
    }

    async fn get_country_by_currency(&self, currency_code: &str) -> Result<Country, GatewayError> {
        let op = GatewayOperation::GetCountryByCurrency;
        check_currency(op, currency_code)?;
        self.call::<_, ()>(op, &[("currency_code", currency_code.to_string())], None).await
    }

    async fn get_rate_by_currencies(&self, from: &str, to: &str) -> Result<ExchangeRate, GatewayError> {
        let op = GatewayOperation::GetRateByCurrencies;
        check_currency(op, from)?;
        check_currency(op, to)?;
        self.call::<_, ()>(op, &[("from_currency", from.to_string()), ("to_currency", to.to_string())], None).await
    }

    async fn get_wallet_balance_by_account_id_and_currency(
        &self,
        account_id: i64,
        currency: &str,
    ) -> Result<WalletBalance, GatewayError> {
        let op = GatewayOperation::GetWalletBalanceByAccountIdAndCurrency;
        check_account_id(op, account_id)?;
        check_currency(op, currency)?;
        self.call(op, &[], Some(json!({ "account_id": account_id, "currency": currency }))).await
    }

    async fn create_wallet_balance(
        &self,
        account_id: i64,
        currency: &str,
        initial: Money,
    ) -> Result<WalletBalance, GatewayError> {
        let op = GatewayOperation::CreateWalletBalance;
        check_account_id(op, account_id)?;
        check_currency(op, currency)?;
        let body = json!({ "account_id": account_id, "currency": currency, "available": initial });
        let wallet: WalletBalance = self.call(op, &[], Some(body)).await?;
        info!("🌐️ Created wallet {currency} for account {account_id}");
        Ok(wallet)
    }

    async fn debit_wallet(&self, mutation: WalletMutation) -> Result<WalletBalance, GatewayError> {
        let op = GatewayOperation::DebitWallet;
        check_wallet_mutation(op, &mutation)?;
        debug!("🌐️ Debiting {} from {} of account {}", mutation.amount, mutation.wallet_name(), mutation.account_id);
        self.call(op, &[], Some(mutation)).await
    }

    async fn credit_wallet(&self, mutation: WalletMutation) -> Result<WalletBalance, GatewayError> {
        let op = GatewayOperation::CreditWallet;
        check_wallet_mutation(op, &mutation)?;
        debug!("🌐️ Crediting {} to {} of account {}", mutation.amount, mutation.wallet_name(), mutation.account_id);
        self.call(op, &[], Some(mutation)).await
    }

    async fn create_exchange_transaction(&self, transaction: NewExchangeTransaction) -> Result<(), GatewayError> {
        let op = GatewayOperation::CreateExchangeTransaction;
        check_exchange_transaction(op, &transaction)?;
        let _: serde_json::Value = self.call(op, &[], Some(transaction)).await?;
        Ok(())
    }

    async fn get_users(&self, filter: UserFilter) -> Result<Vec<User>, GatewayError> {
        let op = GatewayOperation::GetUsers;
        let mut params = vec![("is_mor_enabled", filter.verified_only.to_string())];
        if let Some(search) = filter.search.filter(|s| !s.is_empty()) {
            params.push(("search", search));
        }
        self.call::<_, ()>(op, &params, None).await
    }

    async fn validate_authorization(&self, token: &str) -> Result<User, GatewayError> {
        let op = GatewayOperation::ValidateAuthorization;
        check_token(op, token)?;
        self.call(op, &[], Some(json!({ "type": "bearer", "token": token }))).await
    }

    async fn toggle_mor_status(&self, account_id: i64, enabled: bool) -> Result<(), GatewayError> {
        let op = GatewayOperation::ToggleMorStatus;
        check_account_id(op, account_id)?;
        let _: serde_json::Value = self.call(op, &[], Some(MorStatusUpdate { account_id, enabled })).await?;
        info!("🌐️ MOR status of account {account_id} set to {enabled}");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig {
            auth_service_url: "http://auth.local/".into(),
            payment_service_url: "http://payments.local".into(),
            transactions_service_url: "http://tx.local".into(),
            app_key: "key".to_string().into(),
        }
    }

    #[test]
    fn registry_must_be_complete() {
        let mut endpoints = default_endpoints();
        endpoints.remove(&GatewayOperation::CreditWallet);
        let err = HttpGateway::with_endpoints(config(), endpoints).unwrap_err();
        assert!(matches!(err, GatewayError::Initialization(ref s) if s.contains("credit_wallet")));
    }

    #[test]
    fn urls() {
        let gateway = HttpGateway::new(config()).unwrap();
        let endpoint = gateway.endpoint(GatewayOperation::GetUsers).unwrap().clone();
        assert_eq!(gateway.url(&endpoint), "http://auth.local/v2/users");
        let endpoint = gateway.endpoint(GatewayOperation::DebitWallet).unwrap().clone();
        assert_eq!(gateway.url(&endpoint), "http://payments.local/v2/wallet/debit");
    }

    #[test]
    fn successful_responses_are_unwrapped() {
        let op = GatewayOperation::GetCountryById;
        let body = r#"{"data": {"id": 10, "name": "Nigeria", "currency_code": "NGN"}, "message": "ok"}"#;
        let country: Country = read_response(op, StatusCode::OK, body).unwrap();
        assert_eq!(country.id, 10);
        assert_eq!(country.currency_code, "NGN");

        let err = read_response::<Country>(op, StatusCode::OK, r#"{"id": 10}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Deserialization(ref s) if s.contains("get_country_by_id")));
    }

    #[test]
    fn error_statuses() {
        let op = GatewayOperation::GetWalletBalanceByAccountIdAndCurrency;
        let err = read_response::<WalletBalance>(op, StatusCode::NOT_FOUND, "no such wallet").unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));

        let err = read_response::<WalletBalance>(op, StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();
        match err {
            GatewayError::Downstream { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            },
            e => panic!("Unexpected error: {e}"),
        }
        let err = read_response::<WalletBalance>(op, StatusCode::UNAUTHORIZED, "").unwrap_err();
        assert!(matches!(err, GatewayError::Downstream { status: 401, .. }));
    }

    #[tokio::test]
    async fn malformed_payloads_fail_before_any_io() {
        let gateway = HttpGateway::new(config()).unwrap();
        let err = gateway.get_user_with_account_id(0).await.unwrap_err();
        assert!(matches!(err, GatewayError::RequestFormatError {
            operation: GatewayOperation::GetUserWithAccountId,
            ..
        }));
        let err = gateway.get_rate_by_currencies("", "USD").await.unwrap_err();
        assert!(matches!(err, GatewayError::RequestFormatError { .. }));
        let err = gateway.credit_wallet(WalletMutation::mor(3, "EUR", Money::new(f64::INFINITY))).await.unwrap_err();
        assert!(matches!(err, GatewayError::RequestFormatError { operation: GatewayOperation::CreditWallet, .. }));
    }
}
