use crate::{
    db_types::{NewPayout, Payout},
    mor_api::query_objects::{Paginated, Pagination, PayoutFilter},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait PayoutManagement {
    /// In a single atomic transaction,
    /// * inserts the payout record with a `pending` status,
    /// * marks every transaction in `transaction_ids` as paid out against the new payout.
    ///
    /// Only transactions that are still unpaid are updated. If fewer rows than `transaction_ids.len()` are updated
    /// (because another payout claimed some of them first), nothing is written and
    /// [`StorageError::AlreadyClaimed`] is returned.
    async fn claim_payout(&self, payout: NewPayout, transaction_ids: &[i64]) -> Result<Payout, StorageError>;

    /// Marks a pending payout as successful once its wallet credit has gone through.
    async fn complete_payout(&self, payout_id: i64) -> Result<Payout, StorageError>;

    /// Marks a pending payout as failed and releases its transactions, so that the next run can pay them out again.
    async fn release_payout(&self, payout_id: i64) -> Result<Payout, StorageError>;

    async fn fetch_payout(&self, id: i64) -> Result<Option<Payout>, StorageError>;

    /// Searches payouts, newest first.
    async fn search_payouts(
        &self,
        filter: PayoutFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Payout>, StorageError>;
}
