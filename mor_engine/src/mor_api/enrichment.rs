//! # Fan-out enrichment
//!
//! List endpoints return records decorated with data that lives in sibling services (merchant names, currency
//! codes). [`enrich_all`] fetches that data for every record concurrently, with at most `concurrency` lookups in
//! flight. Records whose lookup fails are dropped and the failures are logged together, so one bad record never
//! fails the whole list. Output order is not the input order.
use std::{fmt::Display, future::Future};

use futures_util::{stream, StreamExt};
use log::*;

use crate::{
    db_types::{Payout, Setting, Transaction, TransactionSummary, Withdrawal},
    gateway::ExternalGateway,
    mor_api::{
        detail_objects::{CurrencySummary, PayoutDetails, SettingDetails, TransactionDetails, WithdrawalDetails},
        errors::MorApiError,
    },
    traits::CustomerManagement,
};

pub const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 16;

/// Runs `f` over every record, keeping the successes.
pub async fn enrich_all<T, U, E, F, Fut>(records: Vec<T>, concurrency: usize, f: F) -> Vec<U>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<U, E>>,
    E: Display,
{
    let total = records.len();
    let results =
        stream::iter(records.into_iter().map(f)).buffer_unordered(concurrency.max(1)).collect::<Vec<_>>().await;
    let mut enriched = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(v) => enriched.push(v),
            Err(e) => failures.push(e.to_string()),
        }
    }
    if !failures.is_empty() {
        warn!(
            "🔍️ {} of {total} records could not be enriched and were dropped. {}",
            failures.len(),
            failures.join("; ")
        );
    }
    enriched
}

/// Decorates storage records with merchant and country details.
pub struct Enricher<'a, B, G> {
    db: &'a B,
    gateway: &'a G,
    concurrency: usize,
}

impl<'a, B, G> Enricher<'a, B, G>
where
    B: CustomerManagement,
    G: ExternalGateway,
{
    pub fn new(db: &'a B, gateway: &'a G, concurrency: usize) -> Self {
        Self { db, gateway, concurrency }
    }

    pub async fn transaction(&self, transaction: Transaction) -> Result<TransactionDetails, MorApiError> {
        let merchant = self.gateway.get_user_with_account_id(transaction.merchant_id).await?;
        let country = self.gateway.get_country_by_id(transaction.country_id).await?;
        let customer_name = match transaction.customer_id {
            Some(id) => self.db.fetch_customer(id).await?.map(|c| c.full_name()).unwrap_or_default(),
            None => String::default(),
        };
        Ok(TransactionDetails {
            transaction,
            merchant_name: merchant.full_name(),
            merchant_email: merchant.email,
            country: country.name,
            currency: country.currency_code,
            customer_name,
        })
    }

    pub async fn transactions(&self, transactions: Vec<Transaction>) -> Vec<TransactionDetails> {
        let mut result = enrich_all(transactions, self.concurrency, |t| self.transaction(t)).await;
        result.sort_by(|a, b| b.transaction.id.cmp(&a.transaction.id));
        result
    }

    pub async fn payout(&self, payout: Payout) -> Result<PayoutDetails, MorApiError> {
        let merchant = self.gateway.get_user_with_account_id(payout.merchant_id).await?;
        let country = self.gateway.get_country_by_id(payout.country_id).await?;
        Ok(PayoutDetails {
            payout,
            merchant_name: merchant.full_name(),
            merchant_email: merchant.email,
            country: country.name,
            currency: country.currency_code,
        })
    }

    pub async fn payouts(&self, payouts: Vec<Payout>) -> Vec<PayoutDetails> {
        let mut result = enrich_all(payouts, self.concurrency, |p| self.payout(p)).await;
        result.sort_by(|a, b| b.payout.id.cmp(&a.payout.id));
        result
    }

    pub async fn setting(&self, setting: Setting) -> Result<SettingDetails, MorApiError> {
        let user = self.gateway.get_user_with_account_id(setting.account_id).await?;
        Ok(SettingDetails { setting, full_name: user.full_name(), email: user.email, account_type: user.account_type })
    }

    pub async fn settings(&self, settings: Vec<Setting>) -> Vec<SettingDetails> {
        let mut result = enrich_all(settings, self.concurrency, |s| self.setting(s)).await;
        result.sort_by(|a, b| b.setting.id.cmp(&a.setting.id));
        result
    }

    pub async fn withdrawal(&self, withdrawal: Withdrawal) -> Result<WithdrawalDetails, MorApiError> {
        let merchant = self.gateway.get_user_with_account_id(withdrawal.merchant_id).await?;
        Ok(WithdrawalDetails { withdrawal, merchant_name: merchant.full_name(), merchant_email: merchant.email })
    }

    pub async fn withdrawals(&self, withdrawals: Vec<Withdrawal>) -> Vec<WithdrawalDetails> {
        let mut result = enrich_all(withdrawals, self.concurrency, |w| self.withdrawal(w)).await;
        result.sort_by(|a, b| {
            a.withdrawal.withdrawal_date.cmp(&b.withdrawal.withdrawal_date).then(a.withdrawal.id.cmp(&b.withdrawal.id))
        });
        result
    }

    pub async fn summary_row(&self, row: TransactionSummary) -> Result<CurrencySummary, MorApiError> {
        let country = self.gateway.get_country_by_id(row.country_id).await?;
        Ok(CurrencySummary { country_id: row.country_id, currency: country.currency_code, amount: row.amount })
    }

    pub async fn summary(&self, rows: Vec<TransactionSummary>) -> Vec<CurrencySummary> {
        let mut result = enrich_all(rows, self.concurrency, |r| self.summary_row(r)).await;
        result.sort_by(|a, b| b.country_id.cmp(&a.country_id));
        result
    }
}
