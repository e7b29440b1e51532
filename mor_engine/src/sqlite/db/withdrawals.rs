use log::{debug, trace};
use mor_common::Money;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::{id_list_clause, push_pagination};
use crate::{
    db_types::{NewWithdrawal, TransactionStatus, Withdrawal},
    mor_api::query_objects::{Paginated, Pagination, WithdrawalFilter},
    traits::StorageError,
};

pub async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, StorageError> {
    let withdrawal: Withdrawal = sqlx::query_as(
        r#"
            INSERT INTO withdrawals (merchant_id, currency, amount, withdrawal_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(withdrawal.merchant_id)
    .bind(withdrawal.currency)
    .bind(withdrawal.amount)
    .bind(withdrawal.withdrawal_date)
    .bind(TransactionStatus::Pending)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Withdrawal #{} of {} {} stored", withdrawal.id, withdrawal.amount, withdrawal.currency);
    Ok(withdrawal)
}

pub async fn fetch_withdrawal(id: i64, conn: &mut SqliteConnection) -> Result<Option<Withdrawal>, StorageError> {
    let w = sqlx::query_as("SELECT * FROM withdrawals WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(w)
}

pub async fn pending_withdrawal_total(
    merchant_id: i64,
    currency: &str,
    conn: &mut SqliteConnection,
) -> Result<Money, StorageError> {
    let total: f64 = sqlx::query_scalar(
        r#"
            SELECT CAST(COALESCE(SUM(amount), 0.0) AS REAL) FROM withdrawals
            WHERE merchant_id = $1 AND currency = $2 AND status = $3
        "#,
    )
    .bind(merchant_id)
    .bind(currency)
    .bind(TransactionStatus::Pending)
    .fetch_one(conn)
    .await?;
    Ok(Money::new(total))
}

pub async fn update_withdrawal_status(
    id: i64,
    status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, StorageError> {
    let result: Option<Withdrawal> =
        sqlx::query_as("UPDATE withdrawals SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or_else(|| StorageError::RecordNotFound(format!("withdrawal #{id}")))
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &WithdrawalFilter) {
    if filter.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(ids) = &filter.merchant_ids {
        where_clause.push(id_list_clause("merchant_id", ids));
    }
    if let Some(currency) = &filter.currency {
        where_clause.push("currency = ");
        where_clause.push_bind_unseparated(currency.clone());
    }
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(from) = filter.from {
        where_clause.push("datetime(withdrawal_date) >= datetime(");
        where_clause.push_bind_unseparated(from);
        where_clause.push_unseparated(")");
    }
    if let Some(to) = filter.to {
        where_clause.push("datetime(withdrawal_date) <= datetime(");
        where_clause.push_bind_unseparated(to);
        where_clause.push_unseparated(")");
    }
}

/// Fetches withdrawals matching the filter, earliest withdrawal date first.
pub async fn search_withdrawals(
    filter: WithdrawalFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Paginated<Withdrawal>, StorageError> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM withdrawals");
    push_filters(&mut count, &filter);
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM withdrawals");
    push_filters(&mut builder, &filter);
    builder.push(" ORDER BY datetime(withdrawal_date) ASC, id ASC");
    push_pagination(&mut builder, &pagination);
    trace!("🗃️ Executing query: {}", builder.sql());
    let items = builder.build_query_as::<Withdrawal>().fetch_all(conn).await?;
    Ok(Paginated::new(items, pagination, total))
}
