use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::TransactionStatus;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

//--------------------------------------      Pagination       --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }.normalized()
    }

    /// Clamps the page to be at least 1 and the limit to `1..=MAX_PAGE_SIZE`.
    pub fn normalized(self) -> Self {
        let page = self.page.max(1);
        let limit = if self.limit <= 0 { DEFAULT_PAGE_SIZE } else { self.limit.min(MAX_PAGE_SIZE) };
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        let p = self.normalized();
        (p.page - 1) * p.limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

/// A page of results, plus the total number of matching records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: i64) -> Self {
        let p = pagination.normalized();
        Self { items, pagination: PageInfo { page: p.page, limit: p.limit, total } }
    }

    pub fn empty(pagination: Pagination) -> Self {
        Self::new(Vec::new(), pagination, 0)
    }

    /// Replaces the items while keeping the page information.
    pub fn with_items<U>(self, items: Vec<U>) -> Paginated<U> {
        Paginated { items, pagination: self.pagination }
    }
}

//--------------------------------------  TransactionFilter    --------------------------------------------------------
/// Storage-level transaction filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub merchant_id: Option<i64>,
    pub reference: Option<String>,
    pub country_id: Option<i64>,
    pub status: Option<TransactionStatus>,
    pub is_paid_out: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        self.merchant_id.is_none() &&
            self.reference.is_none() &&
            self.country_id.is_none() &&
            self.status.is_none() &&
            self.is_paid_out.is_none() &&
            self.from.is_none() &&
            self.to.is_none()
    }

    pub fn with_merchant_id(mut self, merchant_id: i64) -> Self {
        self.merchant_id = Some(merchant_id);
        self
    }

    pub fn with_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_country_id(mut self, country_id: i64) -> Self {
        self.country_id = Some(country_id);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_paid_out(mut self, is_paid_out: bool) -> Self {
        self.is_paid_out = Some(is_paid_out);
        self
    }

    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }
}

/// Caller-facing transaction search parameters. `currency` is resolved to a country before hitting storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionSearch {
    pub search: Option<String>,
    pub currency: Option<String>,
    pub status: Option<TransactionStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub is_paid_out: Option<bool>,
}

//--------------------------------------     PayoutFilter      --------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayoutFilter {
    pub merchant_id: Option<i64>,
    pub reference: Option<String>,
    pub country_id: Option<i64>,
    pub status: Option<TransactionStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl PayoutFilter {
    pub fn is_empty(&self) -> bool {
        self.merchant_id.is_none() &&
            self.reference.is_none() &&
            self.country_id.is_none() &&
            self.status.is_none() &&
            self.from.is_none() &&
            self.to.is_none()
    }

    pub fn with_merchant_id(mut self, merchant_id: i64) -> Self {
        self.merchant_id = Some(merchant_id);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_country_id(mut self, country_id: i64) -> Self {
        self.country_id = Some(country_id);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutSearch {
    pub search: Option<String>,
    pub currency: Option<String>,
    pub status: Option<TransactionStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub merchant_id: Option<i64>,
}

//--------------------------------------   WithdrawalFilter    --------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WithdrawalFilter {
    /// `Some(vec![])` matches nothing.
    pub merchant_ids: Option<Vec<i64>>,
    pub currency: Option<String>,
    pub status: Option<TransactionStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl WithdrawalFilter {
    pub fn is_empty(&self) -> bool {
        self.merchant_ids.is_none() &&
            self.currency.is_none() &&
            self.status.is_none() &&
            self.from.is_none() &&
            self.to.is_none()
    }

    pub fn with_merchant_ids(mut self, ids: Vec<i64>) -> Self {
        self.merchant_ids = Some(ids);
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawalSearch {
    pub search: Option<String>,
    pub currency: Option<String>,
    pub status: Option<TransactionStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

//--------------------------------------    SettingsFilter     --------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsFilter {
    /// `Some(vec![])` matches nothing.
    pub account_ids: Option<Vec<i64>>,
    pub is_verified: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl SettingsFilter {
    pub fn is_empty(&self) -> bool {
        self.account_ids.is_none() && self.is_verified.is_none() && self.from.is_none() && self.to.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsSearch {
    pub search: Option<String>,
    pub is_verified: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

//--------------------------------------    CustomerFilter     --------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerFilter {
    pub account_id: Option<i64>,
    /// Matches email, first name or last name.
    pub search: Option<String>,
}

impl CustomerFilter {
    pub fn is_empty(&self) -> bool {
        self.account_id.is_none() && self.search.is_none()
    }
}
