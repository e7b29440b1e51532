use chrono::Utc;
use mor_common::Money;
use mor_engine::{
    db_types::TransactionStatus,
    gateway::{GatewayOperation, User},
    mor_api::{
        query_objects::{Pagination, TransactionSearch},
        transactions_api::RecordTransactionRequest,
    },
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        InMemoryGateway,
    },
    MorApiError,
    Principal,
    SqliteDatabase,
    TransactionsApi,
};

const NIGERIA: i64 = 10;
const GHANA: i64 = 20;

async fn setup() -> (InMemoryGateway, TransactionsApi<SqliteDatabase, InMemoryGateway>) {
    let db = prepare_test_env(&random_db_path()).await;
    let gateway = InMemoryGateway::new()
        .with_user(1, "Ada", "Obi", "business")
        .with_user(2, "Kofi", "Mensah", "business")
        .with_country(NIGERIA, "Nigeria", "NGN")
        .with_country(GHANA, "Ghana", "GHS");
    let api = TransactionsApi::new(db, gateway.clone()).with_enrichment_concurrency(3);
    (gateway, api)
}

fn sale(account_id: i64, country: i64, reference: &str, amount: f64) -> RecordTransactionRequest {
    RecordTransactionRequest {
        account_id,
        reference: reference.into(),
        country,
        amount: Money::new(amount),
        payment_method: "card".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn recorded_transactions_are_unpaid_and_enriched() {
    let (_, api) = setup().await;
    let tx = api.record_transaction(sale(1, NIGERIA, "INV-1", 42.0)).await.unwrap();
    assert_eq!(tx.transaction.status, TransactionStatus::Successful);
    assert!(!tx.transaction.is_paid_out);
    assert_eq!(tx.transaction.payout_id, None);
    assert_eq!(tx.merchant_name, "Obi Ada");
    assert_eq!(tx.merchant_email, "ada@example.com");
    assert_eq!(tx.country, "Nigeria");
    assert_eq!(tx.currency, "NGN");

    let fetched = api.get_transaction(tx.transaction.id).await.unwrap();
    assert_eq!(fetched.transaction, tx.transaction);
    assert!(matches!(api.get_transaction(999).await, Err(MorApiError::NotFound(_))));
}

#[tokio::test]
async fn bad_transactions_are_rejected() {
    let (_, api) = setup().await;
    let future = Utc::now().timestamp() + 337 * 3600;
    let req = RecordTransactionRequest { transaction_created_at: future, ..sale(1, NIGERIA, "INV-1", 42.0) };
    assert!(matches!(api.record_transaction(req).await, Err(MorApiError::Validation(_))));
    assert!(matches!(api.record_transaction(sale(1, NIGERIA, "INV-1", 0.0)).await, Err(MorApiError::Validation(_))));
    assert!(matches!(api.record_transaction(sale(1, NIGERIA, "  ", 5.0)).await, Err(MorApiError::Validation(_))));
    let soon = Utc::now().timestamp() + 24 * 3600;
    let req = RecordTransactionRequest { transaction_created_at: soon, ..sale(1, NIGERIA, "INV-2", 42.0) };
    let tx = api.record_transaction(req).await.unwrap();
    assert_eq!(tx.transaction.transaction_date.timestamp(), soon);
}

#[tokio::test]
async fn enrichment_failures_drop_records() {
    let (gateway, api) = setup().await;
    for i in 0..5 {
        api.record_transaction(sale(1, NIGERIA, &format!("A-{i}"), 10.0)).await.unwrap();
    }
    for i in 0..3 {
        api.record_transaction(sale(2, GHANA, &format!("B-{i}"), 10.0)).await.unwrap();
    }
    gateway.fail_on_key(GatewayOperation::GetUserWithAccountId, "2");
    let page = api.search_transactions(TransactionSearch::default(), Pagination::new(1, 50)).await.unwrap();
    assert_eq!(page.pagination.total, 8);
    assert_eq!(page.items.len(), 5);
    assert!(page.items.iter().all(|t| t.transaction.merchant_id == 1));
    let ids = page.items.iter().map(|t| t.transaction.id).collect::<Vec<_>>();
    let mut sorted = ids.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn merchant_searches_are_scoped() {
    let (_, api) = setup().await;
    api.record_transaction(sale(1, NIGERIA, "A-1", 10.0)).await.unwrap();
    api.record_transaction(sale(1, GHANA, "A-2", 15.0)).await.unwrap();
    api.record_transaction(sale(2, GHANA, "B-1", 20.0)).await.unwrap();
    let ada = Principal::from(User { account_id: 1, ..Default::default() });

    let mine =
        api.search_merchant_transactions(&ada, TransactionSearch::default(), Pagination::default()).await.unwrap();
    assert_eq!(mine.pagination.total, 2);

    let search = TransactionSearch { currency: Some("ghs".into()), ..Default::default() };
    let ghs = api.search_merchant_transactions(&ada, search, Pagination::default()).await.unwrap();
    assert_eq!(ghs.items.len(), 1);
    assert_eq!(ghs.items[0].transaction.reference, "A-2");

    let search = TransactionSearch { currency: Some("XOF".into()), ..Default::default() };
    let none = api.search_transactions(search, Pagination::default()).await.unwrap();
    assert_eq!(none.pagination.total, 0);

    let search = TransactionSearch { is_paid_out: Some(true), ..Default::default() };
    assert!(api.search_transactions(search, Pagination::default()).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn summaries_group_unpaid_amounts_by_currency() {
    let (gateway, api) = setup().await;
    api.record_transaction(sale(1, NIGERIA, "A-1", 10.0)).await.unwrap();
    api.record_transaction(sale(1, NIGERIA, "A-2", 15.5)).await.unwrap();
    api.record_transaction(sale(1, GHANA, "A-3", 20.0)).await.unwrap();
    api.record_transaction(sale(2, GHANA, "B-1", 1.0)).await.unwrap();

    let summary = api.transaction_summary(Some(1)).await.unwrap();
    assert_eq!(summary.len(), 2);
    assert_eq!((summary[0].country_id, summary[0].currency.as_str()), (GHANA, "GHS"));
    assert_eq!(summary[0].amount, Money::new(20.0));
    assert_eq!(summary[1].amount, Money::new(25.5));

    let everyone = api.transaction_summary(None).await.unwrap();
    assert_eq!(everyone[0].amount, Money::new(21.0));

    gateway.fail_on_key(GatewayOperation::GetCountryById, "20");
    let summary = api.transaction_summary(None).await.unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].currency, "NGN");
}
