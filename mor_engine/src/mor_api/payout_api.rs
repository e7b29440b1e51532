//! # Payouts
//!
//! A payout moves a merchant's backlog of successful, unpaid transactions into their settlement wallets. The backlog
//! is split by country, and each country group becomes one payout record in that country's currency.
//!
//! For each group, in ascending country id order:
//! 1. The country's currency is resolved. If that fails, the group is left for the next run.
//! 2. A `pending` payout record is written and every transaction in the group is marked as paid, in a single database
//!    transaction. If another run has already claimed any of them, the group is skipped.
//! 3. The group total is credited to the merchant's `MOR_<CURRENCY>` wallet. On success the payout becomes
//!    `successful`. On failure it becomes `failed` and its transactions are released for the next run.
//!
//! [`PayoutApi::payout_to_wallets`] runs this for a list of merchants. Short lists run to completion before returning.
//! Long lists are handed off to a background task on the current local task set.
use std::{collections::BTreeMap, fmt::Debug};

use log::*;
use mor_common::Money;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewPayout, Payout, Transaction, TransactionStatus},
    events::{EventProducers, PayoutCreatedEvent},
    gateway::{ExternalGateway, WalletMutation},
    mor_api::{
        country_filter,
        detail_objects::PayoutDetails,
        enrichment::{Enricher, DEFAULT_ENRICHMENT_CONCURRENCY},
        errors::MorApiError,
        principal::Principal,
        query_objects::{Paginated, Pagination, PayoutFilter, PayoutSearch},
        CountryMatch,
    },
    traits::{CustomerManagement, PayoutManagement, StorageError, TransactionManagement},
};

pub const DEFAULT_BULK_PAYOUT_THRESHOLD: usize = 10;
pub const PAYOUT_REFERENCE_LENGTH: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutOutcome {
    NothingToPayOut,
    Completed,
    Started,
}

impl PayoutOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            PayoutOutcome::NothingToPayOut => "nothing to pay out",
            PayoutOutcome::Completed => "payout successful",
            PayoutOutcome::Started => "payout started",
        }
    }
}

pub fn new_payout_reference() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(PAYOUT_REFERENCE_LENGTH).map(char::from).collect()
}

#[derive(Clone)]
pub struct PayoutApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    bulk_threshold: usize,
    enrichment_concurrency: usize,
}

impl<B: Debug, G: Debug> Debug for PayoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutApi ({:?}, {:?}, bulk threshold {})", self.db, self.gateway, self.bulk_threshold)
    }
}

impl<B, G> PayoutApi<B, G>
where
    B: TransactionManagement + PayoutManagement + CustomerManagement,
    G: ExternalGateway,
{
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self {
            db,
            gateway,
            producers,
            bulk_threshold: DEFAULT_BULK_PAYOUT_THRESHOLD,
            enrichment_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY,
        }
    }

    pub fn with_bulk_threshold(mut self, threshold: usize) -> Self {
        self.bulk_threshold = threshold.max(1);
        self
    }

    pub fn with_enrichment_concurrency(mut self, concurrency: usize) -> Self {
        self.enrichment_concurrency = concurrency;
        self
    }

    pub fn bulk_threshold(&self) -> usize {
        self.bulk_threshold
    }

    /// Pays out every unpaid, successful transaction of a merchant. Returns the payout records written, including
    /// failed ones.
    ///
    /// Credit failures are isolated to their country group. A storage failure aborts the remaining groups. Country groups
    /// claimed by a concurrent run are skipped, so each transaction is credited at most once.
    pub async fn payout_merchant(&self, account_id: i64) -> Result<Vec<Payout>, MorApiError> {
        self.gateway
            .get_user_with_account_id(account_id)
            .await
            .map_err(|e| MorApiError::not_found(format!("Merchant {account_id} ({e})")))?;
        let transactions = self.db.fetch_payable_transactions(account_id).await?;
        if transactions.is_empty() {
            debug!("💸️ Merchant {account_id} has nothing to pay out");
            return Ok(Vec::new());
        }
        let mut groups: BTreeMap<i64, Vec<Transaction>> = BTreeMap::new();
        for tx in transactions {
            groups.entry(tx.country_id).or_default().push(tx);
        }
        let mut payouts = Vec::with_capacity(groups.len());
        for (country_id, group) in groups {
            let country = match self.gateway.get_country_by_id(country_id).await {
                Ok(c) => c,
                Err(e) => {
                    error!("💸️ Could not get country {country_id}. Skipping payout for merchant {account_id}. {e}");
                    continue;
                },
            };
            let total = group.iter().map(|t| t.amount).sum::<Money>();
            let ids = group.iter().map(|t| t.id).collect::<Vec<i64>>();
            let payout = NewPayout {
                merchant_id: account_id,
                reference: new_payout_reference(),
                amount: total,
                country_id,
                status: TransactionStatus::Pending,
            };
            let payout = match self.db.claim_payout(payout, &ids).await {
                Ok(p) => p,
                Err(StorageError::AlreadyClaimed(e)) => {
                    warn!("💸️ Another payout run claimed country {country_id} for merchant {account_id} first. {e}");
                    continue;
                },
                Err(e) => return Err(e.into()),
            };
            let credit = WalletMutation::mor(account_id, country.currency_code.as_str(), total);
            let payout = match self.gateway.credit_wallet(credit).await {
                Ok(_) => {
                    let payout = self.db.complete_payout(payout.id).await?;
                    info!(
                        "💸️ Paid out {total} {} to merchant {account_id} for {} transactions. Payout [{}]",
                        country.currency_code,
                        ids.len(),
                        payout.reference
                    );
                    payout
                },
                Err(e) => {
                    error!(
                        "💸️ Error crediting {total} to the MOR {} wallet of {account_id}. {e}",
                        country.currency_code
                    );
                    self.db.release_payout(payout.id).await?
                },
            };
            self.producers.payout_created(PayoutCreatedEvent::new(payout.clone(), country.currency_code)).await;
            payouts.push(payout);
        }
        Ok(payouts)
    }

    /// Runs a payout for each merchant and logs failures. Returns the number of merchants processed without error.
    async fn payout_each(&self, account_ids: &[i64]) -> usize {
        let mut succeeded = 0;
        for &account_id in account_ids {
            match self.payout_merchant(account_id).await {
                Ok(_) => succeeded += 1,
                Err(e) => error!("💸️ Payout for merchant {account_id} failed. {e}"),
            }
        }
        debug!("💸️ Payout run complete. {succeeded} of {} merchants succeeded", account_ids.len());
        succeeded
    }

    /// Pays out every merchant with payable transactions. Used by the periodic payout worker.
    pub async fn payout_all_merchants(&self) -> Result<usize, MorApiError> {
        let merchants = self.db.fetch_merchants_with_payable_transactions().await?;
        info!("💸️ {} merchants have transactions to pay out", merchants.len());
        Ok(self.payout_each(&merchants).await)
    }

    pub async fn get_payout(&self, id: i64) -> Result<PayoutDetails, MorApiError> {
        let payout = self.db.fetch_payout(id).await?.ok_or_else(|| MorApiError::not_found(format!("Payout #{id}")))?;
        self.enricher().payout(payout).await
    }

    /// Searches all payouts. `search.merchant_id` narrows the search to a single merchant.
    pub async fn search_payouts(
        &self,
        search: PayoutSearch,
        pagination: Pagination,
    ) -> Result<Paginated<PayoutDetails>, MorApiError> {
        let mut filter = PayoutFilter {
            merchant_id: search.merchant_id,
            reference: search.search.filter(|s| !s.trim().is_empty()),
            status: search.status,
            from: search.from,
            to: search.to,
            ..Default::default()
        };
        match country_filter(&self.gateway, search.currency.as_deref()).await {
            CountryMatch::Any => {},
            CountryMatch::Country(id) => filter.country_id = Some(id),
            CountryMatch::Nothing => return Ok(Paginated::empty(pagination)),
        }
        let page = self.db.search_payouts(filter, pagination).await?;
        let items = self.enricher().payouts(page.items.clone()).await;
        Ok(page.with_items(items))
    }

    /// Searches the payouts of the calling merchant.
    pub async fn search_merchant_payouts(
        &self,
        principal: &Principal,
        search: PayoutSearch,
        pagination: Pagination,
    ) -> Result<Paginated<PayoutDetails>, MorApiError> {
        let search = PayoutSearch { merchant_id: Some(principal.account_id), ..search };
        self.search_payouts(search, pagination).await
    }

    fn enricher(&self) -> Enricher<'_, B, G> {
        Enricher::new(&self.db, &self.gateway, self.enrichment_concurrency)
    }
}

impl<B, G> PayoutApi<B, G>
where
    B: TransactionManagement + PayoutManagement + CustomerManagement + Clone + 'static,
    G: ExternalGateway + 'static,
{
    /// Pays out a list of merchants.
    ///
    /// Below the bulk threshold the merchants are processed in order, and the first merchant error stops the run and
    /// is returned. Payouts already made for earlier merchants stand. At or above the threshold the run is spawned
    /// onto the current [`tokio::task::LocalSet`] and `Started` is returned straight away. That run logs merchant
    /// errors and carries on. Must be called from within a `LocalSet` (as every actix-web worker is).
    pub async fn payout_to_wallets(&self, account_ids: Vec<i64>) -> Result<PayoutOutcome, MorApiError> {
        if account_ids.is_empty() {
            return Ok(PayoutOutcome::NothingToPayOut);
        }
        if account_ids.len() < self.bulk_threshold {
            for &account_id in &account_ids {
                self.payout_merchant(account_id).await?;
            }
            return Ok(PayoutOutcome::Completed);
        }
        info!("💸️ Starting background payout for {} merchants", account_ids.len());
        let api = self.clone();
        tokio::task::spawn_local(async move {
            api.payout_each(&account_ids).await;
        });
        Ok(PayoutOutcome::Started)
    }
}
