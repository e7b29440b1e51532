use crate::{db_types::WebhookLog, traits::StorageError};

#[allow(async_fn_in_trait)]
pub trait WebhookLogManagement {
    /// Stores the raw webhook body as received, tagged with the provider it was routed to.
    async fn insert_webhook_log(&self, provider: &str, log: &str) -> Result<WebhookLog, StorageError>;
}
