//! # SQLite Database methods
//!
//! "Low-level" SQLite interactions for the MOR store.
//!
//! Everything here is a plain function taking a `&mut SqliteConnection`. Callers either pull a connection from the
//! pool or open a transaction and pass `&mut *tx`, so the same function serves both atomic and one-shot writes.
use std::{env, str::FromStr};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    QueryBuilder,
    Sqlite,
    SqlitePool,
};

use crate::mor_api::query_objects::Pagination;

pub mod customers;
pub mod payouts;
pub mod settings;
pub mod transactions;
pub mod webhook_logs;
pub mod withdrawals;

const SQLITE_DB_URL: &str = "sqlite://data/mor_store.db";

pub fn db_url() -> String {
    let result = env::var("MOR_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ MOR_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool, creating the database file if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Appends `LIMIT .. OFFSET ..` for the given page.
pub(crate) fn push_pagination(builder: &mut QueryBuilder<'_, Sqlite>, pagination: &Pagination) {
    let p = pagination.normalized();
    builder.push(" LIMIT ");
    builder.push_bind(p.limit);
    builder.push(" OFFSET ");
    builder.push_bind(p.offset());
}

/// Renders a list of ids as a literal SQL `IN` list. An empty list renders a clause that matches nothing.
pub(crate) fn id_list_clause(column: &str, ids: &[i64]) -> String {
    if ids.is_empty() {
        return "1 = 0".to_string();
    }
    let ids = ids.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",");
    format!("{column} IN ({ids})")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn id_lists() {
        assert_eq!(id_list_clause("merchant_id", &[3, 1, 2]), "merchant_id IN (3,1,2)");
        assert_eq!(id_list_clause("account_id", &[]), "1 = 0");
    }
}
