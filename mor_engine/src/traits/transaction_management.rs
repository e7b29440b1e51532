use crate::{
    db_types::{NewTransaction, Transaction, TransactionSummary},
    mor_api::query_objects::{Paginated, Pagination, TransactionFilter},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait TransactionManagement {
    /// Stores a new transaction. New transactions are never paid out.
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, StorageError>;

    async fn fetch_transaction(&self, id: i64) -> Result<Option<Transaction>, StorageError>;

    /// Searches transactions, ordered by id descending.
    async fn search_transactions(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Transaction>, StorageError>;

    /// All `successful` transactions for the merchant that have not been paid out yet, in id order.
    async fn fetch_payable_transactions(&self, merchant_id: i64) -> Result<Vec<Transaction>, StorageError>;

    /// The ids of every merchant with at least one payable transaction.
    async fn fetch_merchants_with_payable_transactions(&self) -> Result<Vec<i64>, StorageError>;

    /// Sums unpaid transaction amounts per country, ordered by country id descending. If `merchant_id` is `None`, all
    /// merchants are included.
    async fn transaction_summary(&self, merchant_id: Option<i64>) -> Result<Vec<TransactionSummary>, StorageError>;
}
