//! `SqliteDatabase` is the concrete SQLite backend for the MOR engine. It implements every trait in [`crate::traits`].
use std::fmt::Debug;

use log::*;
use mor_common::Money;
use sqlx::{migrate, SqlitePool};

use super::db::{customers, db_url, new_pool, payouts, settings, transactions, webhook_logs, withdrawals};
use crate::{
    db_types::{
        Customer,
        CustomerPayment,
        NewPaymentHistory,
        NewPayout,
        NewTransaction,
        NewWithdrawal,
        PaymentHistory,
        Payout,
        SaveSetting,
        Setting,
        Transaction,
        TransactionStatus,
        TransactionSummary,
        WebhookLog,
        Withdrawal,
    },
    mor_api::query_objects::{
        CustomerFilter,
        Paginated,
        Pagination,
        PayoutFilter,
        SettingsFilter,
        TransactionFilter,
        WithdrawalFilter,
    },
    traits::{
        CustomerManagement,
        PayoutManagement,
        SettingsManagement,
        StorageError,
        TransactionManagement,
        WebhookLogManagement,
        WithdrawalManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `MOR_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date with the migrations embedded in this crate.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Migration failed. {e}")))?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }
}

impl SettingsManagement for SqliteDatabase {
    async fn fetch_setting_for_account(&self, account_id: i64) -> Result<Option<Setting>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        settings::fetch_setting_for_account(account_id, &mut conn).await
    }

    async fn fetch_setting_by_id(&self, id: i64) -> Result<Option<Setting>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        settings::fetch_setting_by_id(id, &mut conn).await
    }

    async fn save_setting(&self, setting: SaveSetting) -> Result<Setting, StorageError> {
        let mut conn = self.pool.acquire().await?;
        settings::save_setting(setting, &mut conn).await
    }

    async fn search_settings(
        &self,
        filter: SettingsFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Setting>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        settings::search_settings(filter, pagination, &mut conn).await
    }
}

impl TransactionManagement for SqliteDatabase {
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, StorageError> {
        let mut conn = self.pool.acquire().await?;
        transactions::insert_transaction(transaction, &mut conn).await
    }

    async fn fetch_transaction(&self, id: i64) -> Result<Option<Transaction>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transaction(id, &mut conn).await
    }

    async fn search_transactions(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Transaction>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        transactions::search_transactions(filter, pagination, &mut conn).await
    }

    async fn fetch_payable_transactions(&self, merchant_id: i64) -> Result<Vec<Transaction>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_payable_transactions(merchant_id, &mut conn).await
    }

    async fn fetch_merchants_with_payable_transactions(&self) -> Result<Vec<i64>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_merchants_with_payable_transactions(&mut conn).await
    }

    async fn transaction_summary(&self, merchant_id: Option<i64>) -> Result<Vec<TransactionSummary>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        transactions::transaction_summary(merchant_id, &mut conn).await
    }
}

impl PayoutManagement for SqliteDatabase {
    async fn claim_payout(&self, payout: NewPayout, transaction_ids: &[i64]) -> Result<Payout, StorageError> {
        let payout = NewPayout { status: TransactionStatus::Pending, ..payout };
        let mut tx = self.pool.begin().await?;
        let payout = payouts::insert_payout(payout, &mut tx).await?;
        let updated = transactions::mark_paid_out(transaction_ids, payout.id, &mut tx).await?;
        if updated != transaction_ids.len() as u64 {
            warn!(
                "🗃️ Payout {} expected to claim {} transactions, but only {updated} were still unpaid. Rolling back.",
                payout.reference,
                transaction_ids.len()
            );
            return Err(StorageError::AlreadyClaimed(format!(
                "{} of {} transactions for payout {} were already paid out",
                transaction_ids.len() as u64 - updated,
                transaction_ids.len(),
                payout.reference
            )));
        }
        tx.commit().await?;
        debug!("🗃️ Payout #{} claimed {updated} transactions", payout.id);
        Ok(payout)
    }

    async fn complete_payout(&self, payout_id: i64) -> Result<Payout, StorageError> {
        let mut conn = self.pool.acquire().await?;
        payouts::resolve_pending_payout(payout_id, TransactionStatus::Successful, &mut conn).await
    }

    async fn release_payout(&self, payout_id: i64) -> Result<Payout, StorageError> {
        let mut tx = self.pool.begin().await?;
        // Release first. The transactions may only be un-marked while the payout is pending.
        let released = transactions::release_paid_out(payout_id, &mut tx).await?;
        let payout = payouts::resolve_pending_payout(payout_id, TransactionStatus::Failed, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payout #{payout_id} failed. {released} transactions are payable again");
        Ok(payout)
    }

    async fn fetch_payout(&self, id: i64) -> Result<Option<Payout>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        payouts::fetch_payout(id, &mut conn).await
    }

    async fn search_payouts(
        &self,
        filter: PayoutFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Payout>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        payouts::search_payouts(filter, pagination, &mut conn).await
    }
}

impl WithdrawalManagement for SqliteDatabase {
    async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, StorageError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::insert_withdrawal(withdrawal, &mut conn).await
    }

    async fn fetch_withdrawal(&self, id: i64) -> Result<Option<Withdrawal>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::fetch_withdrawal(id, &mut conn).await
    }

    async fn pending_withdrawal_total(&self, merchant_id: i64, currency: &str) -> Result<Money, StorageError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::pending_withdrawal_total(merchant_id, currency, &mut conn).await
    }

    async fn update_withdrawal_status(&self, id: i64, status: TransactionStatus) -> Result<Withdrawal, StorageError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::update_withdrawal_status(id, status, &mut conn).await
    }

    async fn search_withdrawals(
        &self,
        filter: WithdrawalFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Withdrawal>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::search_withdrawals(filter, pagination, &mut conn).await
    }
}

impl CustomerManagement for SqliteDatabase {
    async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        customers::fetch_customer(id, &mut conn).await
    }

    async fn search_customers(
        &self,
        filter: CustomerFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Customer>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        customers::search_customers(filter, pagination, &mut conn).await
    }

    async fn record_customer_payment(
        &self,
        customer: CustomerPayment,
        payment: NewPaymentHistory,
    ) -> Result<Customer, StorageError> {
        let mut tx = self.pool.begin().await?;
        let customer = customers::upsert_paying_customer(customer, &mut tx).await?;
        let history = customers::insert_payment_history(customer.id, payment, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment [{}] recorded for customer #{}", history.reference, customer.id);
        Ok(customer)
    }

    async fn fetch_payment_history(&self, customer_id: i64) -> Result<Vec<PaymentHistory>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        customers::fetch_payment_history(customer_id, &mut conn).await
    }
}

impl WebhookLogManagement for SqliteDatabase {
    async fn insert_webhook_log(&self, provider: &str, log: &str) -> Result<WebhookLog, StorageError> {
        let mut conn = self.pool.acquire().await?;
        webhook_logs::insert_webhook_log(provider, log, &mut conn).await
    }
}
