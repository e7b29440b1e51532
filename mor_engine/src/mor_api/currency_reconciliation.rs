//! # Currency reconciliation
//!
//! A merchant receives payouts into one `MOR_<CODE>` settlement wallet per currency in their setting. Adding a
//! currency provisions its wallet. Removing one first converts whatever is left in it into USD, and USD itself can
//! never be removed.
//!
//! Wallet mutations are not compensated when a later step fails. Instead, the returned
//! [`MorApiError::Reconciliation`] carries the currency set as it actually stands, so the caller can persist it.
//! Both operations are safe to retry: additions skip codes that are already present and removal re-reads the live
//! balance.
use log::*;
use mor_common::{mor_wallet, normalize_currency, Money, USD};

use crate::{
    gateway::{ExternalGateway, GatewayError, NewExchangeTransaction, WalletBalance, WalletMutation},
    mor_api::errors::MorApiError,
};

pub const EXCHANGE_COMPLETED: &str = "completed";

/// Upper-cases the codes and drops blanks and duplicates, keeping first-seen order.
pub fn normalize_currency_set<S: AsRef<str>>(codes: &[S]) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes.iter().map(normalize_currency) {
        if !code.is_empty() && !result.contains(&code) {
            result.push(code);
        }
    }
    result
}

fn reconciliation_error(currency: &str, currencies: &[String], source: GatewayError) -> MorApiError {
    MorApiError::Reconciliation { currency: currency.to_string(), currencies: currencies.to_vec(), source }
}

pub struct CurrencyReconciler<'a, G> {
    gateway: &'a G,
}

impl<'a, G> CurrencyReconciler<'a, G>
where G: ExternalGateway
{
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Fetches the `MOR_` wallet for `code`, creating an empty one if the lookup fails.
    pub async fn ensure_wallet(&self, account_id: i64, code: &str) -> Result<WalletBalance, GatewayError> {
        let wallet = mor_wallet(code);
        match self.gateway.get_wallet_balance_by_account_id_and_currency(account_id, &wallet).await {
            Ok(balance) => Ok(balance),
            Err(e) => {
                debug!("💱️ Could not fetch {wallet} for account {account_id} ({e}). Creating it.");
                self.gateway.create_wallet_balance(account_id, &wallet, Money::default()).await
            },
        }
    }

    /// Adds the requested currencies to `current`, provisioning a zero-balance settlement wallet for each new one.
    ///
    /// Currencies already in the set only have their wallet re-ensured. The first wallet that cannot be provisioned
    /// aborts the call. Wallets created before the failure stay, and are listed in the error's currency set.
    pub async fn add_currencies<S: AsRef<str>>(
        &self,
        account_id: i64,
        current: &[String],
        requested: &[S],
    ) -> Result<Vec<String>, MorApiError> {
        let mut currencies = normalize_currency_set(current);
        for code in normalize_currency_set(requested) {
            if currencies.contains(&code) {
                self.ensure_wallet(account_id, &code).await.map_err(|e| reconciliation_error(&code, &currencies, e))?;
                trace!("💱️ {code} is already held by account {account_id}");
                continue;
            }
            let wallet = mor_wallet(&code);
            if let Err(e) = self.gateway.create_wallet_balance(account_id, &wallet, Money::default()).await {
                error!("💱️ Could not create {wallet} for account {account_id}. {e}");
                return Err(reconciliation_error(&code, &currencies, e));
            }
            info!("💱️ {code} added to the currencies of account {account_id}");
            currencies.push(code);
        }
        Ok(currencies)
    }

    /// Removes the requested currencies from `current`, converting any remaining balance to USD first.
    ///
    /// For each requested code that is held (USD is always skipped):
    /// * A wallet that cannot be read, or holds nothing, needs no conversion. Empty wallets are dropped straight
    ///   away; unreadable ones are left in the set.
    /// * If there is no usable USD rate, the currency is left in the set and the next one is processed.
    /// * Otherwise the conversion is recorded, the full balance is debited and the converted amount is credited to
    ///   `MOR_USD`. Only then is the currency dropped. A failure in any of these steps aborts the call.
    pub async fn remove_currencies<S: AsRef<str>>(
        &self,
        account_id: i64,
        current: &[String],
        requested: &[S],
    ) -> Result<Vec<String>, MorApiError> {
        let mut currencies = normalize_currency_set(current);
        for code in normalize_currency_set(requested) {
            if code == USD {
                debug!("💱️ Ignoring request to remove {USD} from account {account_id}");
                continue;
            }
            if !currencies.contains(&code) {
                continue;
            }
            let source_wallet = mor_wallet(&code);
            let balance =
                match self.gateway.get_wallet_balance_by_account_id_and_currency(account_id, &source_wallet).await {
                    Ok(wallet) => wallet.available,
                    Err(e) => {
                        warn!("💱️ Could not read {source_wallet} for account {account_id}, so {code} is kept. {e}");
                        continue;
                    },
                };
            if balance.value() <= 0.0 {
                currencies.retain(|c| c != &code);
                info!("💱️ {code} removed from account {account_id}. The wallet was empty.");
                continue;
            }
            let rate = match self.gateway.get_rate_by_currencies(&code, USD).await {
                Ok(rate) if rate.is_valid() => rate,
                Ok(_) => {
                    warn!("💱️ There is no {code} -> {USD} rate. {code} is kept for account {account_id}.");
                    continue;
                },
                Err(e) => {
                    error!("💱️ Error getting rate for {code} -> {USD}. {code} is kept for account {account_id}. {e}");
                    continue;
                },
            };
            let converted = rate.convert(balance);
            let exchange = NewExchangeTransaction {
                account_id,
                rate_id: rate.id,
                initial_amount: balance,
                final_amount: converted,
                status: EXCHANGE_COMPLETED.to_string(),
            };
            self.gateway
                .create_exchange_transaction(exchange)
                .await
                .map_err(|e| reconciliation_error(&code, &currencies, e))?;
            self.gateway
                .debit_wallet(WalletMutation::new(account_id, source_wallet.as_str(), balance))
                .await
                .map_err(|e| reconciliation_error(&code, &currencies, e))?;
            self.gateway
                .credit_wallet(WalletMutation::new(account_id, mor_wallet(USD), converted))
                .await
                .map_err(|e| reconciliation_error(&code, &currencies, e))?;
            currencies.retain(|c| c != &code);
            info!("💱️ {code} removed from account {account_id}. {balance} {code} converted to {converted} {USD}.");
        }
        Ok(currencies)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn currency_sets_are_normalized() {
        let set = normalize_currency_set(&["usd", " eur", "USD", "", "Eur", "ngn"]);
        assert_eq!(set, vec!["USD", "EUR", "NGN"]);
    }
}
