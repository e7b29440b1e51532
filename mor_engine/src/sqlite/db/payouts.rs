use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::push_pagination;
use crate::{
    db_types::{NewPayout, Payout, TransactionStatus},
    mor_api::query_objects::{Paginated, Pagination, PayoutFilter},
    traits::StorageError,
};

/// Inserts a payout record. Not atomic by itself; pass `&mut *tx` to embed it in a transaction.
pub async fn insert_payout(payout: NewPayout, conn: &mut SqliteConnection) -> Result<Payout, StorageError> {
    let payout: Payout = sqlx::query_as(
        r#"
            INSERT INTO payouts (merchant_id, reference, amount, country_id, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(payout.merchant_id)
    .bind(payout.reference)
    .bind(payout.amount)
    .bind(payout.country_id)
    .bind(payout.status)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Payout #{} [{}] of {} stored as {}", payout.id, payout.reference, payout.amount, payout.status);
    Ok(payout)
}

/// Moves a pending payout to `status`. Payouts that are no longer pending are left alone and reported as missing.
pub async fn resolve_pending_payout(
    id: i64,
    status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<Payout, StorageError> {
    let payout: Option<Payout> = sqlx::query_as(
        r#"
            UPDATE payouts SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    let payout = payout.ok_or_else(|| StorageError::RecordNotFound(format!("Pending payout #{id}")))?;
    debug!("🗃️ Payout #{id} [{}] is now {}", payout.reference, payout.status);
    Ok(payout)
}

pub async fn fetch_payout(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payout>, StorageError> {
    let payout = sqlx::query_as("SELECT * FROM payouts WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(payout)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &PayoutFilter) {
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
    if let Some(from) = filter.from {
        where_clause.push("datetime(created_at) >= datetime(");
        where_clause.push_bind_unseparated(from);
        where_clause.push_unseparated(")");
    }
    if let Some(to) = filter.to {
        where_clause.push("datetime(created_at) <= datetime(");
        where_clause.push_bind_unseparated(to);
        where_clause.push_unseparated(")");
    }
}

pub async fn search_payouts(
    filter: PayoutFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Paginated<Payout>, StorageError> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM payouts");
    push_filters(&mut count, &filter);
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM payouts");
    push_filters(&mut builder, &filter);
    builder.push(" ORDER BY id DESC");
    push_pagination(&mut builder, &pagination);
    trace!("🗃️ Executing query: {}", builder.sql());
    let items = builder.build_query_as::<Payout>().fetch_all(conn).await?;
    Ok(Paginated::new(items, pagination, total))
}
