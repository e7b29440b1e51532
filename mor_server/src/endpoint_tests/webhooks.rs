use actix_web::{http::StatusCode, test::TestRequest};
use mor_common::Secret;

use super::helpers::{bearer, json, TestContext, MERCHANT_ID, MERCHANT_TOKEN, OTHER_MERCHANT_ID};

const CHARGE: &str = r#"{
    "event": "charge.completed",
    "data": {
        "id": 885201,
        "tx_ref": "MOR-2201",
        "amount": 12000,
        "currency": "NGN",
        "payment_type": "card",
        "status": "successful",
        "created_at": "2024-05-01T09:12:44.000Z",
        "customer": { "name": "Bello Amina", "email": "amina@example.com", "phone_number": "0812" }
    }
}"#;

fn webhook(account_id: i64, hash: Option<&str>, payload: &str) -> TestRequest {
    let mut req = TestRequest::post()
        .uri(&format!("/webhook/{account_id}"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(payload.to_string());
    if let Some(hash) = hash {
        req = req.insert_header(("verif-hash", hash));
    }
    req
}

#[actix_web::test]
async fn charges_create_customers() {
    let mut ctx = TestContext::new().await;
    ctx.flutterwave_secret_hash = Some(Secret::new("s3cret".to_string()));

    let (status, body) = ctx.send(webhook(MERCHANT_ID, Some("s3cret"), CHARGE)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let customer = json(&body);
    assert_eq!(customer["email"], "amina@example.com");
    assert_eq!(customer["number_of_payments"], 1);
    let customer_id = customer["id"].as_i64().unwrap();

    let (status, body) = ctx.send(TestRequest::get().uri("/api/customers").insert_header(bearer(MERCHANT_TOKEN))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["pagination"]["total"], 1);
    let req = TestRequest::get().uri("/api/customers?search=nobody").insert_header(bearer(MERCHANT_TOKEN));
    let (_, body) = ctx.send(req).await;
    assert_eq!(json(&body)["pagination"]["total"], 0);

    let uri = format!("/api/customers/{customer_id}/payments");
    let (status, body) = ctx.send(TestRequest::get().uri(&uri).insert_header(bearer(MERCHANT_TOKEN))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let history = json(&body);
    assert_eq!(history[0]["reference"], "MOR-2201");
    assert_eq!(history[0]["amount"], 12000.0);

    // Customers belong to the merchant whose webhook created them
    let (status, _) = ctx.send(webhook(OTHER_MERCHANT_ID, Some("s3cret"), CHARGE)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = ctx.send(TestRequest::get().uri("/api/customers").insert_header(bearer(MERCHANT_TOKEN))).await;
    assert_eq!(json(&body)["pagination"]["total"], 1);
}

#[actix_web::test]
async fn bad_signatures_are_rejected() {
    let mut ctx = TestContext::new().await;
    ctx.flutterwave_secret_hash = Some(Secret::new("s3cret".to_string()));
    let (status, body) = ctx.send(webhook(MERCHANT_ID, Some("guess"), CHARGE)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json(&body)["error"].as_str().unwrap().contains("signature"), "{body}");

    let (status, _) = ctx.send(webhook(MERCHANT_ID, Some("s3cret"), "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn other_payloads_are_acknowledged() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.send(webhook(MERCHANT_ID, None, r#"{"type": "payment.created"}"#)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["success"], true);
    assert_eq!(json(&body)["message"], "Webhook received");
}
