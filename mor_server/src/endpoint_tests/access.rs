use actix_web::{http::StatusCode, test, test::TestRequest, App};
use mor_engine::{
    gateway::{GatewayError, User},
    SqliteDatabase,
};

use super::{
    helpers::{bearer, call, json, TestContext, ADMIN_TOKEN, MERCHANT_TOKEN},
    mocks::MockGateway,
};
use crate::server::configure_routes;

fn user(account_id: i64, account_type: &str) -> User {
    User {
        account_id,
        email: "user@example.com".into(),
        firstname: "Test".into(),
        lastname: "User".into(),
        account_type: account_type.into(),
    }
}

/// A gateway that knows a single token.
fn gateway_with_token(token: &'static str, account_type: &'static str) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_validate_authorization().returning(move |t| {
        if t == token {
            Ok(user(7, account_type))
        } else {
            Err(GatewayError::Downstream { status: 401, message: "invalid token".into() })
        }
    });
    gateway
}

async fn send(gateway: MockGateway, req: TestRequest) -> (StatusCode, String) {
    let app = App::new().configure(|cfg| configure_routes::<SqliteDatabase, MockGateway>(cfg, gateway));
    let service = test::init_service(app).await;
    call(&service, req.to_request()).await
}

#[actix_web::test]
async fn health_needs_no_token() {
    let (status, body) = send(MockGateway::new(), TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn missing_token() {
    let gateway = MockGateway::new();
    let (status, body) = send(gateway, TestRequest::get().uri("/api/transactions")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json(&body)["error"].as_str().unwrap().contains("No bearer token"), "{body}");
}

#[actix_web::test]
async fn wrong_scheme() {
    let req = TestRequest::get().uri("/api/transactions").insert_header(("Authorization", "Basic abc"));
    let (status, _) = send(MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn rejected_token() {
    let gateway = gateway_with_token(MERCHANT_TOKEN, "business");
    let req = TestRequest::get().uri("/api/transactions").insert_header(bearer("stolen"));
    let (status, body) = send(gateway, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("error"), "{body}");
}

#[actix_web::test]
async fn merchants_cannot_use_admin_routes() {
    let gateway = gateway_with_token(MERCHANT_TOKEN, "business");
    let req = TestRequest::get().uri("/api/admin/transactions").insert_header(bearer(MERCHANT_TOKEN));
    let (status, _) = send(gateway, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let gateway = gateway_with_token(MERCHANT_TOKEN, "business_admin");
    let req = TestRequest::get().uri("/api/admin/payout/1").insert_header(bearer(MERCHANT_TOKEN));
    let (status, body) = send(gateway, req).await;
    // The role check passes, but no API is registered in this app
    assert_ne!(status, StatusCode::FORBIDDEN, "{body}");
    assert_ne!(status, StatusCode::UNAUTHORIZED, "{body}");
}

#[actix_web::test]
async fn missing_records_are_bad_requests() {
    let ctx = TestContext::new().await;
    for uri in ["/api/admin/transaction/99", "/api/admin/payout/99"] {
        let (status, body) = ctx.send(TestRequest::get().uri(uri).insert_header(bearer(ADMIN_TOKEN))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json(&body)["error"].as_str().unwrap().contains("#99"), "{body}");
    }
    let req = TestRequest::patch().uri("/api/admin/withdrawal/complete/99").insert_header(bearer(ADMIN_TOKEN));
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
