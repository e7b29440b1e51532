use mockall::mock;
use mor_common::Money;
use mor_engine::gateway::{
    Country,
    ExchangeRate,
    ExternalGateway,
    GatewayError,
    NewExchangeTransaction,
    User,
    UserFilter,
    WalletBalance,
    WalletMutation,
};

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl ExternalGateway for Gateway {
        async fn get_user_with_account_id(&self, account_id: i64) -> Result<User, GatewayError>;
        async fn get_country_by_id(&self, country_id: i64) -> Result<Country, GatewayError>;
        async fn get_country_by_currency(&self, currency_code: &str) -> Result<Country, GatewayError>;
        async fn get_rate_by_currencies(&self, from: &str, to: &str) -> Result<ExchangeRate, GatewayError>;
        async fn get_wallet_balance_by_account_id_and_currency(&self, account_id: i64, currency: &str) -> Result<WalletBalance, GatewayError>;
        async fn create_wallet_balance(&self, account_id: i64, currency: &str, initial: Money) -> Result<WalletBalance, GatewayError>;
        async fn debit_wallet(&self, mutation: WalletMutation) -> Result<WalletBalance, GatewayError>;
        async fn credit_wallet(&self, mutation: WalletMutation) -> Result<WalletBalance, GatewayError>;
        async fn create_exchange_transaction(&self, transaction: NewExchangeTransaction) -> Result<(), GatewayError>;
        async fn get_users(&self, filter: UserFilter) -> Result<Vec<User>, GatewayError>;
        async fn validate_authorization(&self, token: &str) -> Result<User, GatewayError>;
        async fn toggle_mor_status(&self, account_id: i64, enabled: bool) -> Result<(), GatewayError>;
    }
}
