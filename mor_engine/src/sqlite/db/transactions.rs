use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::push_pagination;
use crate::{
    db_types::{NewTransaction, Transaction, TransactionStatus, TransactionSummary},
    mor_api::query_objects::{Paginated, Pagination, TransactionFilter},
    traits::StorageError,
};

/// The largest number of ids bound into a single `IN (..)` clause.
pub const ID_CHUNK_SIZE: usize = 500;

pub async fn insert_transaction(
    transaction: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, StorageError> {
    let transaction: Transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                merchant_id,
                customer_id,
                reference,
                description,
                amount,
                tax_fee,
                processing_fee,
                country_id,
                payment_method,
                status,
                transaction_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(transaction.merchant_id)
    .bind(transaction.customer_id)
    .bind(transaction.reference)
    .bind(transaction.description)
    .bind(transaction.amount)
    .bind(transaction.tax_fee)
    .bind(transaction.processing_fee)
    .bind(transaction.country_id)
    .bind(transaction.payment_method)
    .bind(transaction.status)
    .bind(transaction.transaction_date)
    .fetch_one(conn)
    .await?;
    debug!(
        "🗃️ Transaction [{}] for merchant {} stored with id {}",
        transaction.reference, transaction.merchant_id, transaction.id
    );
    Ok(transaction)
}

pub async fn fetch_transaction(id: i64, conn: &mut SqliteConnection) -> Result<Option<Transaction>, StorageError> {
    let tx = sqlx::query_as("SELECT * FROM transactions WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(tx)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &TransactionFilter) {
    if filter.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(merchant_id) = filter.merchant_id {
        where_clause.push("merchant_id = ");
        where_clause.push_bind_unseparated(merchant_id);
    }
    if let Some(reference) = &filter.reference {
        where_clause.push("reference LIKE ");
        where_clause.push_bind_unseparated(format!("%{reference}%"));
    }
    if let Some(country_id) = filter.country_id {
        where_clause.push("country_id = ");
        where_clause.push_bind_unseparated(country_id);
    }
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(paid) = filter.is_paid_out {
        where_clause.push("is_paid_out = ");
        where_clause.push_bind_unseparated(paid);
    }
    if let Some(from) = filter.from {
        where_clause.push("datetime(transaction_date) >= datetime(");
        where_clause.push_bind_unseparated(from);
        where_clause.push_unseparated(")");
    }
    if let Some(to) = filter.to {
        where_clause.push("datetime(transaction_date) <= datetime(");
        where_clause.push_bind_unseparated(to);
        where_clause.push_unseparated(")");
    }
}

/// Fetches transactions matching the filter, ordered by `id` descending.
pub async fn search_transactions(
    filter: TransactionFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Paginated<Transaction>, StorageError> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM transactions");
    push_filters(&mut count, &filter);
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM transactions");
    push_filters(&mut builder, &filter);
    builder.push(" ORDER BY id DESC");
    push_pagination(&mut builder, &pagination);
    trace!("🗃️ Executing query: {}", builder.sql());
    let items = builder.build_query_as::<Transaction>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_transactions: {} of {total}", items.len());
    Ok(Paginated::new(items, pagination, total))
}

pub async fn fetch_payable_transactions(
    merchant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, StorageError> {
    let transactions = sqlx::query_as(
        "SELECT * FROM transactions WHERE merchant_id = $1 AND is_paid_out = 0 AND status = $2 ORDER BY id ASC",
    )
    .bind(merchant_id)
    .bind(TransactionStatus::Successful)
    .fetch_all(conn)
    .await?;
    Ok(transactions)
}

pub async fn fetch_merchants_with_payable_transactions(conn: &mut SqliteConnection) -> Result<Vec<i64>, StorageError> {
    let ids = sqlx::query_scalar(
        "SELECT DISTINCT merchant_id FROM transactions WHERE is_paid_out = 0 AND status = $1 ORDER BY merchant_id",
    )
    .bind(TransactionStatus::Successful)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

pub async fn transaction_summary(
    merchant_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Vec<TransactionSummary>, StorageError> {
    let mut builder = QueryBuilder::new(
        "SELECT country_id, CAST(SUM(amount) AS REAL) AS amount FROM transactions WHERE is_paid_out = 0 AND status = ",
    );
    builder.push_bind(TransactionStatus::Successful);
    if let Some(id) = merchant_id {
        builder.push(" AND merchant_id = ");
        builder.push_bind(id);
    }
    builder.push(" GROUP BY country_id ORDER BY country_id DESC");
    let summary = builder.build_query_as::<TransactionSummary>().fetch_all(conn).await?;
    Ok(summary)
}

/// Marks the given transactions as paid out against `payout_id`. Only rows that are still unpaid are touched.
/// Returns the number of rows updated.
///
/// The ids are bound in chunks of [`ID_CHUNK_SIZE`] to stay under SQLite's bound-parameter limit. Run this inside a
/// transaction so that a short count can be rolled back as a whole.
pub async fn mark_paid_out(
    transaction_ids: &[i64],
    payout_id: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, StorageError> {
    let mut updated = 0;
    for chunk in transaction_ids.chunks(ID_CHUNK_SIZE) {
        let mut builder =
            QueryBuilder::new("UPDATE transactions SET is_paid_out = 1, updated_at = CURRENT_TIMESTAMP, payout_id = ");
        builder.push_bind(payout_id);
        builder.push(" WHERE is_paid_out = 0 AND id IN (");
        let mut ids = builder.separated(", ");
        for id in chunk {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        updated += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(updated)
}

/// Returns the transactions of a pending payout to the payable pool.
pub async fn release_paid_out(payout_id: i64, conn: &mut SqliteConnection) -> Result<u64, StorageError> {
    let result = sqlx::query(
        "UPDATE transactions SET is_paid_out = 0, payout_id = NULL, updated_at = CURRENT_TIMESTAMP WHERE payout_id = $1",
    )
    .bind(payout_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
