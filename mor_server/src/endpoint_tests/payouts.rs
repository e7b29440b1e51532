use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest};
use mor_common::Money;
use serde_json::json as body;

use super::helpers::{
    bearer,
    json,
    TestContext,
    ADMIN_TOKEN,
    GHANA,
    MERCHANT_ID,
    MERCHANT_TOKEN,
    NIGERIA,
    OTHER_MERCHANT_ID,
};

fn payout_request(account_ids: &[i64]) -> TestRequest {
    TestRequest::post()
        .uri("/api/admin/payout/to-wallet")
        .insert_header(bearer(ADMIN_TOKEN))
        .set_json(body!({ "account_ids": account_ids }))
}

#[actix_web::test]
async fn empty_payout_requests() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.send(payout_request(&[])).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["outcome"], "nothing_to_pay_out");
    assert_eq!(json(&body)["message"], "nothing to pay out");
}

#[actix_web::test]
async fn payouts_credit_mor_wallets() {
    let ctx = TestContext::new().await;
    ctx.record_transaction(MERCHANT_ID, NIGERIA, "NG-1", 1000.0).await;
    ctx.record_transaction(MERCHANT_ID, NIGERIA, "NG-2", 500.0).await;
    ctx.record_transaction(MERCHANT_ID, GHANA, "GH-1", 80.0).await;

    let (status, body) = ctx.send(payout_request(&[MERCHANT_ID])).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["outcome"], "completed");
    assert_eq!(ctx.gateway.balance(MERCHANT_ID, "MOR_NGN"), Some(Money::new(1500.0)));
    assert_eq!(ctx.gateway.balance(MERCHANT_ID, "MOR_GHS"), Some(Money::new(80.0)));

    let (_, body) = ctx.send(TestRequest::get().uri("/api/payouts").insert_header(bearer(MERCHANT_TOKEN))).await;
    let page = json(&body);
    assert_eq!(page["pagination"]["total"], 2);
    let req = TestRequest::get().uri("/api/payouts?currency=NGN").insert_header(bearer(MERCHANT_TOKEN));
    let (_, body) = ctx.send(req).await;
    let page = json(&body);
    assert_eq!(page["pagination"]["total"], 1);
    assert_eq!(page["items"][0]["amount"], 1500.0);
    assert_eq!(page["items"][0]["status"], "successful");
    assert_eq!(page["items"][0]["reference"].as_str().unwrap().len(), 25);

    let id = page["items"][0]["id"].as_i64().unwrap();
    let req = TestRequest::get().uri(&format!("/api/admin/payout/{id}")).insert_header(bearer(ADMIN_TOKEN));
    let (status, body) = ctx.send(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["merchant_name"], "Obi Ada");

    // Everything was paid, so a second run changes nothing
    let (_, body) = ctx.send(payout_request(&[MERCHANT_ID])).await;
    assert_eq!(json(&body)["outcome"], "completed");
    assert_eq!(ctx.gateway.balance(MERCHANT_ID, "MOR_NGN"), Some(Money::new(1500.0)));
    let req = TestRequest::get().uri("/api/transactions?is_paid_out=true").insert_header(bearer(MERCHANT_TOKEN));
    let (_, body) = ctx.send(req).await;
    assert_eq!(json(&body)["pagination"]["total"], 3);
}

#[actix_web::test]
async fn unknown_merchants_stop_short_payouts() {
    let ctx = TestContext::new().await;
    ctx.record_transaction(MERCHANT_ID, NIGERIA, "NG-1", 10.0).await;
    let (status, _) = ctx.send(payout_request(&[MERCHANT_ID, 404])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // The merchant before the failure was still paid
    assert_eq!(ctx.gateway.balance(MERCHANT_ID, "MOR_NGN"), Some(Money::new(10.0)));
}

#[actix_web::test]
async fn long_payout_lists_run_in_the_background() {
    let mut ctx = TestContext::new().await;
    ctx.bulk_threshold = 2;
    ctx.record_transaction(MERCHANT_ID, NIGERIA, "NG-1", 10.0).await;
    ctx.record_transaction(OTHER_MERCHANT_ID, GHANA, "GH-1", 20.0).await;

    let (status, body) = ctx.send(payout_request(&[404, MERCHANT_ID, OTHER_MERCHANT_ID])).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["outcome"], "started");

    let mut paid = false;
    for _ in 0..50 {
        if ctx.gateway.balance(OTHER_MERCHANT_ID, "MOR_GHS").is_some() {
            paid = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(paid, "The background payout did not finish");
    assert_eq!(ctx.gateway.balance(MERCHANT_ID, "MOR_NGN"), Some(Money::new(10.0)));
}
