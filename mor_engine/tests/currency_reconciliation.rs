use mor_common::Money;
use mor_engine::{gateway::GatewayOperation, test_utils::InMemoryGateway, CurrencyReconciler, MorApiError};

const MERCHANT: i64 = 1;

fn gateway() -> InMemoryGateway {
    let _ = env_logger::try_init();
    InMemoryGateway::new()
        .with_wallet(MERCHANT, "MOR_USD", 0.0)
        .with_wallet(MERCHANT, "MOR_EUR", 100.0)
        .with_rate(7, "EUR", "USD", 1.1, 1.0)
}

fn set(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

#[tokio::test]
async fn removing_a_currency_converts_its_balance_to_usd() {
    let gateway = gateway();
    let reconciler = CurrencyReconciler::new(&gateway);
    let result = reconciler.remove_currencies(MERCHANT, &set(&["USD", "EUR"]), &["eur"]).await.unwrap();
    assert_eq!(result, set(&["USD"]));
    assert_eq!(gateway.balance(MERCHANT, "MOR_EUR"), Some(Money::new(0.0)));
    assert_eq!(gateway.balance(MERCHANT, "MOR_USD"), Some(Money::new(110.0)));
    let exchanges = gateway.exchange_transactions();
    assert_eq!(exchanges.len(), 1);
    assert_eq!(exchanges[0].rate_id, 7);
    assert_eq!(exchanges[0].initial_amount, Money::new(100.0));
    assert_eq!(exchanges[0].final_amount, Money::new(110.0));
    assert_eq!(exchanges[0].status, "completed");
}

#[tokio::test]
async fn usd_is_never_removed() {
    let gateway = gateway();
    let reconciler = CurrencyReconciler::new(&gateway);
    let result = reconciler.remove_currencies(MERCHANT, &set(&["USD", "EUR"]), &["usd", "Usd", "USD"]).await.unwrap();
    assert_eq!(result, set(&["USD", "EUR"]));
    assert_eq!(gateway.call_count(GatewayOperation::GetWalletBalanceByAccountIdAndCurrency), 0);
    assert_eq!(gateway.call_count(GatewayOperation::DebitWallet), 0);
}

#[tokio::test]
async fn zero_initial_amount_converts_to_nothing() {
    let gateway = gateway().with_rate(8, "EUR", "USD", 1.1, 0.0);
    let reconciler = CurrencyReconciler::new(&gateway);
    let result = reconciler.remove_currencies(MERCHANT, &set(&["USD", "EUR"]), &["EUR"]).await.unwrap();
    assert_eq!(result, set(&["USD"]));
    assert_eq!(gateway.balance(MERCHANT, "MOR_EUR"), Some(Money::new(0.0)));
    assert_eq!(gateway.balance(MERCHANT, "MOR_USD"), Some(Money::new(0.0)));
    assert_eq!(gateway.exchange_transactions()[0].final_amount, Money::new(0.0));
}

#[tokio::test]
async fn empty_wallets_are_dropped_without_a_rate() {
    let gateway = gateway().with_wallet(MERCHANT, "MOR_NGN", 0.0);
    let reconciler = CurrencyReconciler::new(&gateway);
    let result = reconciler.remove_currencies(MERCHANT, &set(&["USD", "NGN"]), &["ngn"]).await.unwrap();
    assert_eq!(result, set(&["USD"]));
    assert_eq!(gateway.call_count(GatewayOperation::GetRateByCurrencies), 0);
    assert!(gateway.exchange_transactions().is_empty());
}

#[tokio::test]
async fn currencies_without_a_rate_are_kept() {
    let gateway = gateway().with_wallet(MERCHANT, "MOR_GHS", 50.0).with_wallet(MERCHANT, "MOR_KES", 0.0);
    let reconciler = CurrencyReconciler::new(&gateway);
    let current = set(&["USD", "GHS", "KES"]);
    let result = reconciler.remove_currencies(MERCHANT, &current, &["GHS", "KES"]).await.unwrap();
    // GHS has no USD rate, so it stays. KES is empty, so it goes.
    assert_eq!(result, set(&["USD", "GHS"]));
    assert_eq!(gateway.balance(MERCHANT, "MOR_GHS"), Some(Money::new(50.0)));
    assert_eq!(gateway.call_count(GatewayOperation::DebitWallet), 0);
}

#[tokio::test]
async fn failed_credit_keeps_the_currency() {
    let gateway = gateway();
    gateway.fail_on_key(GatewayOperation::CreditWallet, "MOR_USD");
    let reconciler = CurrencyReconciler::new(&gateway);
    let err = reconciler.remove_currencies(MERCHANT, &set(&["USD", "EUR"]), &["EUR"]).await.unwrap_err();
    match err {
        MorApiError::Reconciliation { currency, currencies, .. } => {
            assert_eq!(currency, "EUR");
            assert_eq!(currencies, set(&["USD", "EUR"]));
        },
        e => panic!("Unexpected error: {e}"),
    }
    // The debit leg went through and is not compensated
    assert_eq!(gateway.balance(MERCHANT, "MOR_EUR"), Some(Money::new(0.0)));
    assert_eq!(gateway.balance(MERCHANT, "MOR_USD"), Some(Money::new(0.0)));
}

#[tokio::test]
async fn adding_currencies_is_idempotent() {
    let gateway = gateway();
    let reconciler = CurrencyReconciler::new(&gateway);
    let once = reconciler.add_currencies(MERCHANT, &set(&["USD"]), &["ngn"]).await.unwrap();
    let twice = reconciler.add_currencies(MERCHANT, &once, &["NGN", " ngn "]).await.unwrap();
    assert_eq!(once, set(&["USD", "NGN"]));
    assert_eq!(twice, set(&["USD", "NGN"]));
    assert_eq!(gateway.balance(MERCHANT, "MOR_NGN"), Some(Money::new(0.0)));
}

#[tokio::test]
async fn add_stops_at_the_first_wallet_that_cannot_be_created() {
    let gateway = gateway();
    gateway.fail_on_key(GatewayOperation::CreateWalletBalance, "MOR_GHS");
    let reconciler = CurrencyReconciler::new(&gateway);
    let err = reconciler.add_currencies(MERCHANT, &set(&["USD"]), &["NGN", "GHS", "KES"]).await.unwrap_err();
    match err {
        MorApiError::Reconciliation { currency, currencies, .. } => {
            assert_eq!(currency, "GHS");
            assert_eq!(currencies, set(&["USD", "NGN"]));
        },
        e => panic!("Unexpected error: {e}"),
    }
    assert!(gateway.has_wallet(MERCHANT, "MOR_NGN"));
    assert!(!gateway.has_wallet(MERCHANT, "MOR_KES"));
}

#[tokio::test]
async fn unreadable_balances_keep_the_currency() {
    let gateway = gateway();
    gateway.fail_on_key(GatewayOperation::GetWalletBalanceByAccountIdAndCurrency, "MOR_EUR");
    let reconciler = CurrencyReconciler::new(&gateway);
    let result = reconciler.remove_currencies(MERCHANT, &set(&["USD", "EUR"]), &["EUR"]).await.unwrap();
    assert_eq!(result, set(&["USD", "EUR"]));
    assert_eq!(gateway.balance(MERCHANT, "MOR_EUR"), Some(Money::new(100.0)));
    assert_eq!(gateway.call_count(GatewayOperation::GetRateByCurrencies), 0);
    assert!(gateway.exchange_transactions().is_empty());
}
