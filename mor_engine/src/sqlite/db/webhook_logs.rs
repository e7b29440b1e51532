use sqlx::SqliteConnection;

use crate::{db_types::WebhookLog, traits::StorageError};

pub async fn insert_webhook_log(
    provider: &str,
    log: &str,
    conn: &mut SqliteConnection,
) -> Result<WebhookLog, StorageError> {
    let entry = sqlx::query_as("INSERT INTO webhook_logs (provider, log) VALUES ($1, $2) RETURNING *")
        .bind(provider)
        .bind(log)
        .fetch_one(conn)
        .await?;
    Ok(entry)
}
