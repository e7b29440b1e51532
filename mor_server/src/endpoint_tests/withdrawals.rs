use actix_web::{http::StatusCode, test::TestRequest};
use mor_common::Money;
use serde_json::json as body;

use super::helpers::{bearer, json, TestContext, ADMIN_TOKEN, MERCHANT_ID, MERCHANT_TOKEN};

fn withdraw(currency: &str, amount: f64) -> TestRequest {
    TestRequest::post()
        .uri("/api/withdrawal/request")
        .insert_header(bearer(MERCHANT_TOKEN))
        .set_json(body!({ "currency": currency, "amount": amount }))
}

async fn funded_context() -> TestContext {
    let mut ctx = TestContext::new().await;
    ctx.gateway = ctx.gateway.clone().with_wallet(MERCHANT_ID, "MOR_EUR", 100.0);
    ctx
}

#[actix_web::test]
async fn pending_withdrawals_reserve_funds() {
    let ctx = funded_context().await;
    let (status, body) = ctx.send(withdraw("eur", 60.0)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let withdrawal = json(&body);
    assert_eq!(withdrawal["currency"], "EUR");
    assert_eq!(withdrawal["status"], "pending");

    let (status, body) = ctx.send(withdraw("MOR_EUR", 50.0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("EUR"), "{body}");

    let (status, _) = ctx.send(withdraw("EUR", 40.0)).await;
    assert_eq!(status, StatusCode::OK);
    // Nothing is debited until an admin completes the withdrawal
    assert_eq!(ctx.gateway.balance(MERCHANT_ID, "MOR_EUR"), Some(Money::new(100.0)));
}

#[actix_web::test]
async fn invalid_withdrawal_requests() {
    let ctx = funded_context().await;
    for req in [withdraw("EUR", 0.0), withdraw("", 10.0), withdraw("GBP", 10.0)] {
        let (status, _) = ctx.send(req).await;
        assert_ne!(status, StatusCode::OK);
    }
    let req = TestRequest::post()
        .uri("/api/withdrawal/request")
        .insert_header(bearer(MERCHANT_TOKEN))
        .set_json(body!({ "currency": "EUR", "amount": 10, "withdrawal_date": 4_102_444_800_i64 }));
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn admins_complete_withdrawals() {
    let ctx = funded_context().await;
    let (_, body) = ctx.send(withdraw("EUR", 30.0)).await;
    let id = json(&body)["id"].as_i64().unwrap();

    let (status, body) =
        ctx.send(TestRequest::get().uri("/api/admin/withdrawals").insert_header(bearer(ADMIN_TOKEN))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page = json(&body);
    assert_eq!(page["pagination"]["total"], 1);
    assert_eq!(page["items"][0]["merchant_name"], "Obi Ada");

    let complete =
        || TestRequest::patch().uri(&format!("/api/admin/withdrawal/complete/{id}")).insert_header(bearer(ADMIN_TOKEN));
    let (status, body) = ctx.send(complete()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["status"], "successful");
    assert_eq!(ctx.gateway.balance(MERCHANT_ID, "MOR_EUR"), Some(Money::new(70.0)));

    let (status, body) = ctx.send(complete()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("already"), "{body}");
    assert_eq!(ctx.gateway.balance(MERCHANT_ID, "MOR_EUR"), Some(Money::new(70.0)));

    let (_, body) = ctx.send(TestRequest::get().uri("/api/admin/withdrawals").insert_header(bearer(ADMIN_TOKEN))).await;
    assert_eq!(json(&body)["pagination"]["total"], 0);
    let req = TestRequest::get().uri("/api/admin/withdrawals?status=successful").insert_header(bearer(ADMIN_TOKEN));
    let (_, body) = ctx.send(req).await;
    assert_eq!(json(&body)["pagination"]["total"], 1);
}
