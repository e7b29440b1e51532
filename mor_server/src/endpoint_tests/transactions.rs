use actix_web::{http::StatusCode, test::TestRequest};
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

#[actix_web::test]
async fn recorded_transactions_are_enriched() {
    let ctx = TestContext::new().await;
    let id = ctx.record_transaction(MERCHANT_ID, NIGERIA, "REF-001", 1500.0).await;

    let req = TestRequest::get().uri(&format!("/api/admin/transaction/{id}")).insert_header(bearer(ADMIN_TOKEN));
    let (status, body) = ctx.send(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let tx = json(&body);
    assert_eq!(tx["reference"], "REF-001");
    assert_eq!(tx["merchant_name"], "Obi Ada");
    assert_eq!(tx["currency"], "NGN");
    assert_eq!(tx["country"], "Nigeria");
    assert_eq!(tx["is_paid_out"], false);
}

#[actix_web::test]
async fn invalid_transactions_are_rejected() {
    let ctx = TestContext::new().await;
    let bad = [
        body!({ "account_id": MERCHANT_ID, "reference": "REF-1", "country": NIGERIA, "amount": 0 }),
        body!({ "account_id": MERCHANT_ID, "reference": "  ", "country": NIGERIA, "amount": 10 }),
        body!({ "account_id": 0, "reference": "REF-2", "country": NIGERIA, "amount": 10 }),
    ];
    for tx in bad {
        let req = TestRequest::post().uri("/api/admin/transaction").insert_header(bearer(ADMIN_TOKEN)).set_json(tx);
        let (status, body) = ctx.send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }
    let req = TestRequest::post()
        .uri("/api/admin/transaction")
        .insert_header(bearer(ADMIN_TOKEN))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{ not json");
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn merchants_only_see_their_own_transactions() {
    let ctx = TestContext::new().await;
    ctx.record_transaction(MERCHANT_ID, NIGERIA, "MINE-1", 100.0).await;
    ctx.record_transaction(MERCHANT_ID, GHANA, "MINE-2", 20.0).await;
    ctx.record_transaction(OTHER_MERCHANT_ID, NIGERIA, "THEIRS-1", 50.0).await;

    let req = TestRequest::get().uri("/api/transactions").insert_header(bearer(MERCHANT_TOKEN));
    let (status, body) = ctx.send(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page = json(&body);
    assert_eq!(page["pagination"]["total"], 2);
    let refs = page["items"].as_array().unwrap().iter().map(|t| t["reference"].as_str().unwrap()).collect::<Vec<_>>();
    assert_eq!(refs, vec!["MINE-2", "MINE-1"]);

    let req = TestRequest::get().uri("/api/transactions?currency=ghs").insert_header(bearer(MERCHANT_TOKEN));
    let (_, body) = ctx.send(req).await;
    assert_eq!(json(&body)["pagination"]["total"], 1);

    let req = TestRequest::get().uri("/api/admin/transactions?limit=1").insert_header(bearer(ADMIN_TOKEN));
    let (status, body) = ctx.send(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page = json(&body);
    assert_eq!(page["pagination"]["total"], 3);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn summaries() {
    let ctx = TestContext::new().await;
    ctx.record_transaction(MERCHANT_ID, NIGERIA, "A", 100.0).await;
    ctx.record_transaction(MERCHANT_ID, NIGERIA, "B", 50.5).await;
    ctx.record_transaction(OTHER_MERCHANT_ID, GHANA, "C", 20.0).await;

    let req = TestRequest::get().uri("/api/transactions/summary").insert_header(bearer(MERCHANT_TOKEN));
    let (status, body) = ctx.send(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let summary = json(&body);
    assert_eq!(summary.as_array().unwrap().len(), 1);
    assert_eq!(summary[0]["currency"], "NGN");
    assert_eq!(summary[0]["amount"], 150.5);

    let req = TestRequest::get().uri("/api/admin/transactions/summary").insert_header(bearer(ADMIN_TOKEN));
    let (_, body) = ctx.send(req).await;
    let summary = json(&body);
    assert_eq!(summary[0]["currency"], "GHS");
    assert_eq!(summary[1]["currency"], "NGN");

    let uri = format!("/api/admin/transactions/summary/{OTHER_MERCHANT_ID}");
    let (_, body) = ctx.send(TestRequest::get().uri(&uri).insert_header(bearer(ADMIN_TOKEN))).await;
    assert_eq!(json(&body)[0]["amount"], 20.0);
}
