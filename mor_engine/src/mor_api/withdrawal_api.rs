//! Withdrawals move funds out of a merchant's settlement wallets.
//!
//! A merchant requests a withdrawal, which is recorded as `pending` once the wallet can cover it. Pending withdrawals
//! reserve funds: a new request only succeeds if the wallet balance, less every pending withdrawal in the same
//! currency, covers it. The wallet is only debited when an admin completes the withdrawal.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use mor_common::{mor_wallet, strip_wallet_prefix, Money};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewWithdrawal, TransactionStatus, Withdrawal},
    events::{EventProducers, WithdrawalRequestedEvent},
    gateway::{ExternalGateway, UserFilter, WalletMutation},
    mor_api::{
        detail_objects::WithdrawalDetails,
        enrichment::{Enricher, DEFAULT_ENRICHMENT_CONCURRENCY},
        errors::MorApiError,
        principal::Principal,
        query_objects::{Paginated, Pagination, WithdrawalFilter, WithdrawalSearch},
        timestamp_or_now,
    },
    traits::{CustomerManagement, WithdrawalManagement},
};

/// How far in the future a withdrawal may be scheduled.
pub const MAX_WITHDRAWAL_LEAD_HOURS: i64 = 8736;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawalRequest {
    pub currency: String,
    pub amount: Money,
    /// Unix seconds. Zero means now.
    pub withdrawal_date: i64,
}

pub struct WithdrawalApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    enrichment_concurrency: usize,
}

impl<B: Debug, G: Debug> Debug for WithdrawalApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WithdrawalApi ({:?}, {:?})", self.db, self.gateway)
    }
}

impl<B, G> WithdrawalApi<B, G>
where
    B: WithdrawalManagement + CustomerManagement,
    G: ExternalGateway,
{
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, enrichment_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY }
    }

    pub fn with_enrichment_concurrency(mut self, concurrency: usize) -> Self {
        self.enrichment_concurrency = concurrency;
        self
    }

    pub async fn request_withdrawal(
        &self,
        principal: &Principal,
        req: WithdrawalRequest,
    ) -> Result<Withdrawal, MorApiError> {
        let withdrawal_date = timestamp_or_now(req.withdrawal_date, Duration::hours(MAX_WITHDRAWAL_LEAD_HOURS))?;
        if !req.amount.is_positive() {
            return Err(MorApiError::validation(format!("amount must be greater than zero, not {}", req.amount)));
        }
        let currency = strip_wallet_prefix(&req.currency);
        if currency.is_empty() {
            return Err(MorApiError::validation("currency cannot be empty"));
        }
        let account_id = principal.account_id;
        let wallet =
            self.gateway.get_wallet_balance_by_account_id_and_currency(account_id, &mor_wallet(&currency)).await?;
        let reserved = self.db.pending_withdrawal_total(account_id, &currency).await?;
        let available = wallet.available - reserved;
        if available < req.amount {
            warn!(
                "💰️ Merchant {account_id} asked to withdraw {} {currency}, but only {available} is available",
                req.amount
            );
            return Err(MorApiError::InsufficientBalance {
                currency,
                requested: req.amount.to_string(),
                available: available.to_string(),
            });
        }
        let withdrawal = NewWithdrawal { merchant_id: account_id, currency, amount: req.amount, withdrawal_date };
        let withdrawal = self.db.insert_withdrawal(withdrawal).await?;
        info!(
            "💰️ Withdrawal #{} of {} {} requested by merchant {account_id}",
            withdrawal.id, withdrawal.amount, withdrawal.currency
        );
        self.producers.withdrawal_requested(WithdrawalRequestedEvent::new(withdrawal.clone(), &principal.email)).await;
        Ok(withdrawal)
    }

    /// Debits the merchant's settlement wallet and marks the withdrawal as successful. Only pending withdrawals can be
    /// completed.
    pub async fn complete_withdrawal(&self, id: i64) -> Result<Withdrawal, MorApiError> {
        let withdrawal =
            self.db.fetch_withdrawal(id).await?.ok_or_else(|| MorApiError::not_found(format!("Withdrawal #{id}")))?;
        if withdrawal.status != TransactionStatus::Pending {
            return Err(MorApiError::validation(format!("Withdrawal #{id} is already {}", withdrawal.status)));
        }
        let debit = WalletMutation::mor(withdrawal.merchant_id, withdrawal.currency.as_str(), withdrawal.amount);
        self.gateway.debit_wallet(debit).await?;
        let withdrawal = self.db.update_withdrawal_status(id, TransactionStatus::Successful).await?;
        info!(
            "💰️ Withdrawal #{id} completed. {} {} debited from merchant {}",
            withdrawal.amount, withdrawal.currency, withdrawal.merchant_id
        );
        Ok(withdrawal)
    }

    /// Lists withdrawals, oldest withdrawal date first. Only pending withdrawals are listed unless a status is given.
    pub async fn search_withdrawals(
        &self,
        search: WithdrawalSearch,
        pagination: Pagination,
    ) -> Result<Paginated<WithdrawalDetails>, MorApiError> {
        let mut filter = WithdrawalFilter {
            status: Some(search.status.unwrap_or(TransactionStatus::Pending)),
            from: search.from,
            to: search.to,
            ..Default::default()
        };
        if let Some(currency) = search.currency.map(strip_wallet_prefix).filter(|c| !c.is_empty()) {
            filter = filter.with_currency(currency);
        }
        if let Some(term) = search.search.filter(|s| !s.trim().is_empty()) {
            let users = self.gateway.get_users(UserFilter::verified_matching(term)).await?;
            filter = filter.with_merchant_ids(users.into_iter().map(|u| u.account_id).collect());
        }
        let page = self.db.search_withdrawals(filter, pagination).await?;
        let enricher = Enricher::new(&self.db, &self.gateway, self.enrichment_concurrency);
        let items = enricher.withdrawals(page.items.clone()).await;
        Ok(page.with_items(items))
    }
}
