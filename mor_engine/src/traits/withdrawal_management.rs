use mor_common::Money;

use crate::{
    db_types::{NewWithdrawal, TransactionStatus, Withdrawal},
    mor_api::query_objects::{Paginated, Pagination, WithdrawalFilter},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait WithdrawalManagement {
    /// Stores a new withdrawal request with `pending` status.
    async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, StorageError>;

    async fn fetch_withdrawal(&self, id: i64) -> Result<Option<Withdrawal>, StorageError>;

    /// The sum of all `pending` withdrawals for the merchant in the given currency. Zero if there are none.
    async fn pending_withdrawal_total(&self, merchant_id: i64, currency: &str) -> Result<Money, StorageError>;

    /// Sets the status of the withdrawal, returning the updated record. Returns `RecordNotFound` if there is no
    /// withdrawal with the given id.
    async fn update_withdrawal_status(&self, id: i64, status: TransactionStatus) -> Result<Withdrawal, StorageError>;

    /// Searches withdrawals, ordered by withdrawal date ascending.
    async fn search_withdrawals(
        &self,
        filter: WithdrawalFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Withdrawal>, StorageError>;
}
