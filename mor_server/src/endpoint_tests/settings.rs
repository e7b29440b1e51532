use actix_web::{http::StatusCode, test::TestRequest};
use mor_engine::gateway::GatewayOperation;
use serde_json::json as body;

use super::helpers::{bearer, json, TestContext, ADMIN_TOKEN, GHANA, MERCHANT_ID, MERCHANT_TOKEN, NIGERIA};

async fn save_settings(ctx: &TestContext) -> i64 {
    let settings = body!({
        "countries": [NIGERIA, GHANA],
        "wallet_currency_codes": ["ngn", "USD"],
        "business_type_id": 3,
        "usage_type": "online",
        "documents": [
            { "country_id": NIGERIA, "document_url": "https://docs.example.com/ng.pdf" },
            { "country_id": GHANA, "document_url": "https://docs.example.com/gh.pdf" }
        ]
    });
    let req = TestRequest::post().uri("/api/settings").insert_header(bearer(MERCHANT_TOKEN)).set_json(settings);
    let (status, body) = ctx.send(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    json(&body)["id"].as_i64().expect("setting id")
}

#[actix_web::test]
async fn new_merchants_have_no_settings() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.send(TestRequest::get().uri("/api/settings").insert_header(bearer(MERCHANT_TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");
}

#[actix_web::test]
async fn saving_settings_provisions_wallets() {
    let ctx = TestContext::new().await;
    save_settings(&ctx).await;
    assert!(ctx.gateway.has_wallet(MERCHANT_ID, "MOR_NGN"));
    assert!(ctx.gateway.has_wallet(MERCHANT_ID, "MOR_USD"));

    let (_, body) = ctx.send(TestRequest::get().uri("/api/settings").insert_header(bearer(MERCHANT_TOKEN))).await;
    let setting = json(&body);
    assert_eq!(setting["account_id"], MERCHANT_ID);
    assert_eq!(setting["currency_codes"], body!(["NGN", "USD"]));
    assert_eq!(setting["countries"][1]["currency_code"], "GHS");
    assert_eq!(setting["verifications"][0]["status"], "pending");
    assert_eq!(setting["is_verified"], false);

    let req = TestRequest::post()
        .uri("/api/settings")
        .insert_header(bearer(MERCHANT_TOKEN))
        .set_json(body!({ "countries": [99] }));
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn payment_methods() {
    let ctx = TestContext::new().await;
    let uri = "/api/settings/payment-methods/enable";
    let req = TestRequest::post()
        .uri(uri)
        .insert_header(bearer(MERCHANT_TOKEN))
        .set_json(body!({ "methods": ["Card", "mobile_money", "card"] }));
    let (status, body) = ctx.send(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["payment_methods"], body!(["card", "mobile_money"]));

    let req = TestRequest::post()
        .uri("/api/settings/payment-methods/DISABLE")
        .insert_header(bearer(MERCHANT_TOKEN))
        .set_json(body!({ "methods": ["card"] }));
    let (_, body) = ctx.send(req).await;
    assert_eq!(json(&body)["payment_methods"], body!(["mobile_money"]));

    let req = TestRequest::post()
        .uri("/api/settings/payment-methods/toggle")
        .insert_header(bearer(MERCHANT_TOKEN))
        .set_json(body!({ "methods": ["card"] }));
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn wallets_can_be_added_and_removed() {
    let ctx = TestContext::new().await;
    let wallets = |action: &str, codes: &[&str]| {
        TestRequest::post()
            .uri(&format!("/api/settings/wallets/{action}"))
            .insert_header(bearer(MERCHANT_TOKEN))
            .set_json(body!({ "currency_codes": codes }))
    };
    let (status, body) = ctx.send(wallets("add", &["eur", "usd"])).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let map = json(&body);
    assert!(map.get("MOR_EUR").is_some(), "{body}");
    assert!(map.get("MOR_USD").is_some(), "{body}");

    // An empty wallet is dropped without conversion. USD can never be removed.
    let (status, body) = ctx.send(wallets("delete", &["EUR", "USD"])).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let map = json(&body);
    assert!(map.get("MOR_EUR").is_none(), "{body}");
    assert!(map.get("MOR_USD").is_some(), "{body}");
    assert_eq!(ctx.gateway.call_count(GatewayOperation::CreateExchangeTransaction), 0);

    let (status, _) = ctx.send(wallets("remove", &["EUR"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn verified_documents_enable_mor() {
    let ctx = TestContext::new().await;
    let id = save_settings(&ctx).await;
    let verify = |country_id: i64, status: &str| {
        TestRequest::post()
            .uri(&format!("/api/admin/settings/{id}/document"))
            .insert_header(bearer(ADMIN_TOKEN))
            .set_json(body!({ "country_id": country_id, "status": status }))
    };

    let (status, body) = ctx.send(verify(NIGERIA, "verified")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["is_verified"], false);
    assert!(!ctx.gateway.mor_enabled(MERCHANT_ID));

    let (_, body) = ctx.send(verify(GHANA, "verified")).await;
    assert_eq!(json(&body)["is_verified"], true);
    assert!(ctx.gateway.mor_enabled(MERCHANT_ID));

    let (status, _) = ctx.send(verify(55, "verified")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::get().uri("/api/admin/settings?is_verified=true").insert_header(bearer(ADMIN_TOKEN));
    let (status, body) = ctx.send(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page = json(&body);
    assert_eq!(page["pagination"]["total"], 1);
    assert_eq!(page["items"][0]["full_name"], "Obi Ada");
    assert_eq!(page["items"][0]["email"], "ada@example.com");

    let req = TestRequest::post()
        .uri("/api/admin/settings/1/document")
        .insert_header(bearer(MERCHANT_TOKEN))
        .set_json(body!({ "country_id": NIGERIA, "status": "verified" }));
    let (status, _) = ctx.send(req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
