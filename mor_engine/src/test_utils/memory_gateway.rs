//! A deterministic, in-process stand-in for the sibling services.
//!
//! Users, countries, rates and wallets live in memory. Any operation can be made to fail, either always or only for
//! a given key (a wallet name, currency code or id, depending on the operation), and every call is recorded.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use mor_common::{normalize_currency, Money};

use crate::gateway::{
    validation,
    Country,
    ExchangeRate,
    ExternalGateway,
    GatewayError,
    GatewayOperation,
    NewExchangeTransaction,
    User,
    UserFilter,
    WalletBalance,
    WalletMutation,
};

#[derive(Default)]
struct GatewayState {
    users: HashMap<i64, User>,
    countries: HashMap<i64, Country>,
    rates: HashMap<(String, String), ExchangeRate>,
    wallets: HashMap<(i64, String), Money>,
    tokens: HashMap<String, i64>,
    mor_enabled: HashMap<i64, bool>,
    exchange_transactions: Vec<NewExchangeTransaction>,
    failures: Vec<(GatewayOperation, Option<String>)>,
    calls: Vec<(GatewayOperation, String)>,
}

#[derive(Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl std::fmt::Debug for InMemoryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InMemoryGateway")
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().expect("gateway state lock poisoned")
    }

    pub fn with_user(self, account_id: i64, firstname: &str, lastname: &str, account_type: &str) -> Self {
        let user = User {
            account_id,
            email: format!("{}@example.com", firstname.to_ascii_lowercase()),
            firstname: firstname.into(),
            lastname: lastname.into(),
            account_type: account_type.into(),
        };
        self.state().users.insert(account_id, user);
        self
    }

    pub fn with_country(self, id: i64, name: &str, currency_code: &str) -> Self {
        let country = Country { id, name: name.into(), currency_code: currency_code.into() };
        self.state().countries.insert(id, country);
        self
    }

    pub fn with_rate(self, id: i64, from: &str, to: &str, amount: f64, initial_amount: f64) -> Self {
        let rate = ExchangeRate { id, from_currency: from.into(), to_currency: to.into(), amount, initial_amount };
        self.state().rates.insert((normalize_currency(from), normalize_currency(to)), rate);
        self
    }

    /// Sets the balance of the wallet called `wallet`, e.g. `MOR_EUR`.
    pub fn with_wallet(self, account_id: i64, wallet: &str, balance: f64) -> Self {
        self.state().wallets.insert((account_id, wallet.to_string()), Money::new(balance));
        self
    }

    pub fn with_token(self, token: &str, account_id: i64) -> Self {
        self.state().tokens.insert(token.to_string(), account_id);
        self
    }

    pub fn with_mor_enabled(self, account_id: i64) -> Self {
        self.state().mor_enabled.insert(account_id, true);
        self
    }

    /// Makes every call of `operation` fail.
    pub fn fail_on(&self, operation: GatewayOperation) {
        self.state().failures.push((operation, None));
    }

    /// Makes calls of `operation` fail when they concern `key`.
    pub fn fail_on_key(&self, operation: GatewayOperation, key: &str) {
        self.state().failures.push((operation, Some(key.to_string())));
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    pub fn balance(&self, account_id: i64, wallet: &str) -> Option<Money> {
        self.state().wallets.get(&(account_id, wallet.to_string())).copied()
    }

    pub fn has_wallet(&self, account_id: i64, wallet: &str) -> bool {
        self.balance(account_id, wallet).is_some()
    }

    pub fn exchange_transactions(&self) -> Vec<NewExchangeTransaction> {
        self.state().exchange_transactions.clone()
    }

    pub fn mor_enabled(&self, account_id: i64) -> bool {
        self.state().mor_enabled.get(&account_id).copied().unwrap_or(false)
    }

    pub fn call_count(&self, operation: GatewayOperation) -> usize {
        self.state().calls.iter().filter(|(op, _)| *op == operation).count()
    }

    /// The keys of every call made to `operation`, in order.
    pub fn calls_to(&self, operation: GatewayOperation) -> Vec<String> {
        self.state().calls.iter().filter(|(op, _)| *op == operation).map(|(_, key)| key.clone()).collect()
    }

    fn enter(&self, operation: GatewayOperation, key: &str) -> Result<MutexGuard<'_, GatewayState>, GatewayError> {
        let mut state = self.state();
        state.calls.push((operation, key.to_string()));
        let fails = state.failures.iter().any(|(op, k)| *op == operation && k.as_deref().map_or(true, |k| k == key));
        if fails {
            return Err(GatewayError::Downstream {
                status: 500,
                message: format!("injected {operation} failure for {key}"),
            });
        }
        Ok(state)
    }
}

fn wallet_balance(account_id: i64, currency: &str, available: Money) -> WalletBalance {
    WalletBalance { account_id, currency: currency.to_string(), available }
}

impl ExternalGateway for InMemoryGateway {
    async fn get_user_with_account_id(&self, account_id: i64) -> Result<User, GatewayError> {
        let state = self.enter(GatewayOperation::GetUserWithAccountId, &account_id.to_string())?;
        state.users.get(&account_id).cloned().ok_or_else(|| GatewayError::NotFound(format!("User {account_id}")))
    }

    async fn get_country_by_id(&self, country_id: i64) -> Result<Country, GatewayError> {
        let state = self.enter(GatewayOperation::GetCountryById, &country_id.to_string())?;
        state.countries.get(&country_id).cloned().ok_or_else(|| GatewayError::NotFound(format!("Country {country_id}")))
    }

    async fn get_country_by_currency(&self, currency_code: &str) -> Result<Country, GatewayError> {
        let code = normalize_currency(currency_code);
        let state = self.enter(GatewayOperation::GetCountryByCurrency, &code)?;
        state
            .countries
            .values()
            .filter(|c| c.currency_code == code)
            .min_by_key(|c| c.id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("Country using {code}")))
    }

    async fn get_rate_by_currencies(&self, from: &str, to: &str) -> Result<ExchangeRate, GatewayError> {
        let key = (normalize_currency(from), normalize_currency(to));
        let state = self.enter(GatewayOperation::GetRateByCurrencies, &key.0)?;
        Ok(state.rates.get(&key).cloned().unwrap_or_default())
    }

    async fn get_wallet_balance_by_account_id_and_currency(
        &self,
        account_id: i64,
        currency: &str,
    ) -> Result<WalletBalance, GatewayError> {
        let state = self.enter(GatewayOperation::GetWalletBalanceByAccountIdAndCurrency, currency)?;
        state
            .wallets
            .get(&(account_id, currency.to_string()))
            .map(|available| wallet_balance(account_id, currency, *available))
            .ok_or_else(|| GatewayError::NotFound(format!("Wallet {currency} of {account_id}")))
    }

    async fn create_wallet_balance(
        &self,
        account_id: i64,
        currency: &str,
        initial: Money,
    ) -> Result<WalletBalance, GatewayError> {
        validation::check_currency(GatewayOperation::CreateWalletBalance, currency)?;
        let mut state = self.enter(GatewayOperation::CreateWalletBalance, currency)?;
        let available = *state.wallets.entry((account_id, currency.to_string())).or_insert(initial);
        Ok(wallet_balance(account_id, currency, available))
    }

    async fn debit_wallet(&self, mutation: WalletMutation) -> Result<WalletBalance, GatewayError> {
        validation::check_wallet_mutation(GatewayOperation::DebitWallet, &mutation)?;
        let wallet = mutation.wallet_name();
        let mut state = self.enter(GatewayOperation::DebitWallet, &wallet)?;
        let balance = state
            .wallets
            .get_mut(&(mutation.account_id, wallet.clone()))
            .ok_or_else(|| GatewayError::NotFound(format!("Wallet {wallet} of {}", mutation.account_id)))?;
        if *balance < mutation.amount {
            return Err(GatewayError::Downstream { status: 400, message: format!("insufficient funds in {wallet}") });
        }
        *balance -= mutation.amount;
        Ok(wallet_balance(mutation.account_id, &wallet, *balance))
    }

    async fn credit_wallet(&self, mutation: WalletMutation) -> Result<WalletBalance, GatewayError> {
        validation::check_wallet_mutation(GatewayOperation::CreditWallet, &mutation)?;
        let wallet = mutation.wallet_name();
        let mut state = self.enter(GatewayOperation::CreditWallet, &wallet)?;
        let balance = state.wallets.entry((mutation.account_id, wallet.clone())).or_default();
        *balance += mutation.amount;
        Ok(wallet_balance(mutation.account_id, &wallet, *balance))
    }

    async fn create_exchange_transaction(&self, transaction: NewExchangeTransaction) -> Result<(), GatewayError> {
        let mut state = self.enter(GatewayOperation::CreateExchangeTransaction, &transaction.rate_id.to_string())?;
        state.exchange_transactions.push(transaction);
        Ok(())
    }

    async fn get_users(&self, filter: UserFilter) -> Result<Vec<User>, GatewayError> {
        let search = filter.search.clone().unwrap_or_default().to_ascii_lowercase();
        let state = self.enter(GatewayOperation::GetUsers, &search)?;
        let mut users = state
            .users
            .values()
            .filter(|u| !filter.verified_only || state.mor_enabled.get(&u.account_id).copied().unwrap_or(false))
            .filter(|u| {
                search.is_empty() ||
                    [&u.email, &u.firstname, &u.lastname].iter().any(|f| f.to_ascii_lowercase().contains(&search))
            })
            .cloned()
            .collect::<Vec<User>>();
        users.sort_by_key(|u| u.account_id);
        Ok(users)
    }

    async fn validate_authorization(&self, token: &str) -> Result<User, GatewayError> {
        let state = self.enter(GatewayOperation::ValidateAuthorization, token)?;
        state
            .tokens
            .get(token)
            .and_then(|id| state.users.get(id))
            .cloned()
            .ok_or_else(|| GatewayError::Downstream { status: 401, message: "invalid token".into() })
    }

    async fn toggle_mor_status(&self, account_id: i64, enabled: bool) -> Result<(), GatewayError> {
        let mut state = self.enter(GatewayOperation::ToggleMorStatus, &account_id.to_string())?;
        state.mor_enabled.insert(account_id, enabled);
        Ok(())
    }
}
