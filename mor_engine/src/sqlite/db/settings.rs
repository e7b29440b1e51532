use log::{debug, trace};
use serde::de::DeserializeOwned;
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Row, Sqlite, SqliteConnection};

use super::{id_list_clause, push_pagination};
use crate::{
    db_types::{SaveSetting, Setting},
    mor_api::query_objects::{Paginated, Pagination, SettingsFilter},
    traits::StorageError,
};

impl<'r> FromRow<'r, SqliteRow> for Setting {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            account_id: row.try_get("account_id")?,
            business_type_id: row.try_get("business_type_id")?,
            usage_type: row.try_get("usage_type")?,
            countries: json_column(row, "countries")?,
            currency_codes: json_column(row, "currency_codes")?,
            payment_methods: json_column(row, "payment_methods")?,
            verifications: json_column(row, "verifications")?,
            is_verified: row.try_get("is_verified")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn json_column<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode { index: column.to_string(), source: Box::new(e) })
}

pub async fn fetch_setting_for_account(
    account_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Setting>, StorageError> {
    let setting =
        sqlx::query_as("SELECT * FROM settings WHERE account_id = $1").bind(account_id).fetch_optional(conn).await?;
    Ok(setting)
}

pub async fn fetch_setting_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Setting>, StorageError> {
    let setting = sqlx::query_as("SELECT * FROM settings WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(setting)
}

/// Upserts on `account_id`. The first save for an account creates the row.
pub async fn save_setting(setting: SaveSetting, conn: &mut SqliteConnection) -> Result<Setting, StorageError> {
    let countries = serde_json::to_string(&setting.countries)?;
    let currency_codes = serde_json::to_string(&setting.currency_codes)?;
    let payment_methods = serde_json::to_string(&setting.payment_methods)?;
    let verifications = serde_json::to_string(&setting.verifications)?;
    let saved: Setting = sqlx::query_as(
        r#"
            INSERT INTO settings (
                account_id,
                business_type_id,
                usage_type,
                countries,
                currency_codes,
                payment_methods,
                verifications,
                is_verified
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (account_id) DO UPDATE SET
                business_type_id = excluded.business_type_id,
                usage_type = excluded.usage_type,
                countries = excluded.countries,
                currency_codes = excluded.currency_codes,
                payment_methods = excluded.payment_methods,
                verifications = excluded.verifications,
                is_verified = excluded.is_verified,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(setting.account_id)
    .bind(setting.business_type_id)
    .bind(setting.usage_type)
    .bind(countries)
    .bind(currency_codes)
    .bind(payment_methods)
    .bind(verifications)
    .bind(setting.is_verified)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Settings for account {} saved (id {})", saved.account_id, saved.id);
    Ok(saved)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &SettingsFilter) {
    if filter.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(ids) = &filter.account_ids {
        where_clause.push(id_list_clause("account_id", ids));
    }
    if let Some(verified) = filter.is_verified {
        where_clause.push("is_verified = ");
        where_clause.push_bind_unseparated(verified);
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

pub async fn search_settings(
    filter: SettingsFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Paginated<Setting>, StorageError> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM settings");
    push_filters(&mut count, &filter);
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM settings");
    push_filters(&mut builder, &filter);
    builder.push(" ORDER BY id DESC");
    push_pagination(&mut builder, &pagination);
    trace!("🗃️ Executing query: {}", builder.sql());
    let items = builder.build_query_as::<Setting>().fetch_all(conn).await?;
    Ok(Paginated::new(items, pagination, total))
}
