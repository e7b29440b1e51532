use actix_web::{
    body::{to_bytes, MessageBody},
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    App,
};
use log::debug;
use mor_common::Secret;
use mor_engine::{
    events::EventProducers,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        InMemoryGateway,
    },
    CustomersApi,
    PayoutApi,
    SettingsApi,
    SqliteDatabase,
    TransactionsApi,
    WebhooksApi,
    WithdrawalApi,
};
use serde_json::Value;

use crate::server::configure_routes;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const MERCHANT_TOKEN: &str = "merchant-token";
pub const ADMIN_ID: i64 = 1;
pub const MERCHANT_ID: i64 = 7;
pub const OTHER_MERCHANT_ID: i64 = 8;
pub const NIGERIA: i64 = 10;
pub const GHANA: i64 = 20;

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}

/// Calls the service and turns both successful responses and middleware errors into a status and body.
pub async fn call<S, R, B>(service: &S, req: R) -> (StatusCode, String)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match test::try_call_service(service, req).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

/// A fresh database and gateway with an admin, two merchants and two countries.
pub struct TestContext {
    pub db: SqliteDatabase,
    pub gateway: InMemoryGateway,
    pub flutterwave_secret_hash: Option<Secret<String>>,
    pub bulk_threshold: usize,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = prepare_test_env(&random_db_path()).await;
        let gateway = InMemoryGateway::new()
            .with_user(ADMIN_ID, "Grace", "Hopper", "admin")
            .with_user(MERCHANT_ID, "Ada", "Obi", "business")
            .with_user(OTHER_MERCHANT_ID, "Kofi", "Mensah", "business")
            .with_country(NIGERIA, "Nigeria", "NGN")
            .with_country(GHANA, "Ghana", "GHS")
            .with_token(ADMIN_TOKEN, ADMIN_ID)
            .with_token(MERCHANT_TOKEN, MERCHANT_ID);
        Self { db, gateway, flutterwave_secret_hash: None, bulk_threshold: 10 }
    }

    pub async fn send(&self, req: TestRequest) -> (StatusCode, String) {
        let db = self.db.clone();
        let gateway = self.gateway.clone();
        let webhooks_api =
            WebhooksApi::new(db.clone()).with_flutterwave_secret_hash(self.flutterwave_secret_hash.clone());
        let payout_api = PayoutApi::new(db.clone(), gateway.clone(), EventProducers::default())
            .with_bulk_threshold(self.bulk_threshold);
        let app = App::new()
            .app_data(web::Data::new(SettingsApi::new(db.clone(), gateway.clone())))
            .app_data(web::Data::new(TransactionsApi::new(db.clone(), gateway.clone())))
            .app_data(web::Data::new(payout_api))
            .app_data(web::Data::new(WithdrawalApi::new(db.clone(), gateway.clone(), EventProducers::default())))
            .app_data(web::Data::new(CustomersApi::new(db)))
            .app_data(web::Data::new(webhooks_api))
            .configure(|cfg| configure_routes::<SqliteDatabase, InMemoryGateway>(cfg, gateway));
        let service = test::init_service(app).await;
        debug!("Making request");
        call(&service, req.to_request()).await
    }

    /// Records a transaction through the admin endpoint and returns its id.
    pub async fn record_transaction(&self, merchant_id: i64, country: i64, reference: &str, amount: f64) -> i64 {
        let body = serde_json::json!({
            "account_id": merchant_id,
            "reference": reference,
            "country": country,
            "amount": amount,
            "payment_method": "card",
        });
        let req = TestRequest::post().uri("/api/admin/transaction").insert_header(bearer(ADMIN_TOKEN)).set_json(body);
        let (status, body) = self.send(req).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        json(&body)["id"].as_i64().expect("transaction id")
    }
}
