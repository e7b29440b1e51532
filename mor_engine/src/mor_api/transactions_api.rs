use std::fmt::Debug;

use chrono::Duration;
use log::*;
use mor_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::NewTransaction,
    gateway::ExternalGateway,
    mor_api::{
        country_filter,
        detail_objects::{CurrencySummary, TransactionDetails},
        enrichment::{Enricher, DEFAULT_ENRICHMENT_CONCURRENCY},
        errors::MorApiError,
        principal::Principal,
        query_objects::{Paginated, Pagination, TransactionFilter, TransactionSearch},
        timestamp_or_now,
        CountryMatch,
    },
    traits::{CustomerManagement, TransactionManagement},
};

/// How far in the future a transaction date may be.
pub const MAX_TRANSACTION_LEAD_HOURS: i64 = 336;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordTransactionRequest {
    pub account_id: i64,
    pub reference: String,
    pub description: String,
    /// Country id
    pub country: i64,
    pub amount: Money,
    pub tax_fee: Money,
    pub processing_fee: Money,
    pub payment_method: String,
    pub customer_id: Option<i64>,
    /// Unix seconds. Zero means now.
    pub transaction_created_at: i64,
}

pub struct TransactionsApi<B, G> {
    db: B,
    gateway: G,
    enrichment_concurrency: usize,
}

impl<B: Debug, G: Debug> Debug for TransactionsApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TransactionsApi ({:?}, {:?})", self.db, self.gateway)
    }
}

impl<B, G> TransactionsApi<B, G>
where
    B: TransactionManagement + CustomerManagement,
    G: ExternalGateway,
{
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway, enrichment_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY }
    }

    pub fn with_enrichment_concurrency(mut self, concurrency: usize) -> Self {
        self.enrichment_concurrency = concurrency;
        self
    }

    /// Records a successful, unpaid transaction for a merchant and returns it with its details.
    pub async fn record_transaction(&self, req: RecordTransactionRequest) -> Result<TransactionDetails, MorApiError> {
        let transaction_date =
            timestamp_or_now(req.transaction_created_at, Duration::hours(MAX_TRANSACTION_LEAD_HOURS))?;
        if req.account_id <= 0 {
            return Err(MorApiError::validation("account_id must be positive"));
        }
        if req.reference.trim().is_empty() {
            return Err(MorApiError::validation("reference cannot be empty"));
        }
        if !req.amount.is_positive() {
            return Err(MorApiError::validation(format!("amount must be greater than zero, not {}", req.amount)));
        }
        let transaction = NewTransaction {
            customer_id: req.customer_id,
            description: req.description,
            tax_fee: req.tax_fee,
            processing_fee: req.processing_fee,
            payment_method: req.payment_method,
            transaction_date,
            ..NewTransaction::new(req.account_id, req.country, req.reference.trim().to_string(), req.amount)
        };
        let transaction = self.db.insert_transaction(transaction).await?;
        info!(
            "🧾️ Transaction [{}] of {} recorded for merchant {}",
            transaction.reference, transaction.amount, transaction.merchant_id
        );
        self.enricher().transaction(transaction).await
    }

    pub async fn get_transaction(&self, id: i64) -> Result<TransactionDetails, MorApiError> {
        let transaction =
            self.db.fetch_transaction(id).await?.ok_or_else(|| MorApiError::not_found(format!("Transaction #{id}")))?;
        self.enricher().transaction(transaction).await
    }

    /// Searches transactions across all merchants. Unless `is_paid_out` is given, only unpaid transactions match.
    pub async fn search_transactions(
        &self,
        search: TransactionSearch,
        pagination: Pagination,
    ) -> Result<Paginated<TransactionDetails>, MorApiError> {
        self.search(None, search, pagination).await
    }

    /// Searches the transactions of the calling merchant.
    pub async fn search_merchant_transactions(
        &self,
        principal: &Principal,
        search: TransactionSearch,
        pagination: Pagination,
    ) -> Result<Paginated<TransactionDetails>, MorApiError> {
        self.search(Some(principal.account_id), search, pagination).await
    }

    async fn search(
        &self,
        merchant_id: Option<i64>,
        search: TransactionSearch,
        pagination: Pagination,
    ) -> Result<Paginated<TransactionDetails>, MorApiError> {
        let mut filter = TransactionFilter {
            merchant_id,
            reference: search.search.filter(|s| !s.trim().is_empty()),
            status: search.status,
            is_paid_out: Some(search.is_paid_out.unwrap_or(false)),
            from: search.from,
            to: search.to,
            ..Default::default()
        };
        match country_filter(&self.gateway, search.currency.as_deref()).await {
            CountryMatch::Any => {},
            CountryMatch::Country(id) => filter.country_id = Some(id),
            CountryMatch::Nothing => return Ok(Paginated::empty(pagination)),
        }
        let page = self.db.search_transactions(filter, pagination).await?;
        let items = self.enricher().transactions(page.items.clone()).await;
        Ok(page.with_items(items))
    }

    /// Unpaid totals per currency, for one merchant or for everyone.
    pub async fn transaction_summary(&self, merchant_id: Option<i64>) -> Result<Vec<CurrencySummary>, MorApiError> {
        let rows = self.db.transaction_summary(merchant_id).await?;
        Ok(self.enricher().summary(rows).await)
    }

    fn enricher(&self) -> Enricher<'_, B, G> {
        Enricher::new(&self.db, &self.gateway, self.enrichment_concurrency)
    }
}
