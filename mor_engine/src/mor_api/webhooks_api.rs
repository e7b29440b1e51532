use std::fmt::Debug;

use log::*;
use mor_common::Secret;

use crate::{
    db_types::Customer,
    mor_api::{
        errors::MorApiError,
        providers::{flutterwave, WebhookProvider},
    },
    traits::{CustomerManagement, WebhookLogManagement},
};

/// Receives payment provider webhooks on behalf of merchants.
pub struct WebhooksApi<B> {
    db: B,
    flutterwave_secret_hash: Option<Secret<String>>,
}

impl<B: Debug> Debug for WebhooksApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhooksApi ({:?})", self.db)
    }
}

impl<B> WebhooksApi<B>
where B: WebhookLogManagement + CustomerManagement
{
    pub fn new(db: B) -> Self {
        Self { db, flutterwave_secret_hash: None }
    }

    /// When set, Flutterwave webhooks must carry this value in their `verif-hash` header.
    pub fn with_flutterwave_secret_hash(mut self, hash: Option<Secret<String>>) -> Self {
        self.flutterwave_secret_hash = hash;
        self
    }

    /// Stores the raw payload in the webhook log and then lets the sending provider's handler act on it.
    ///
    /// Returns the customer whose payment was recorded, if any.
    pub async fn handle_webhook(
        &self,
        account_id: i64,
        verif_hash: Option<&str>,
        body: &str,
    ) -> Result<Option<Customer>, MorApiError> {
        let provider = WebhookProvider::detect(verif_hash);
        trace!("🪝️ Webhook for merchant {account_id} from {provider}: {body}");
        if let Err(e) = self.db.insert_webhook_log(provider.as_str(), body).await {
            warn!("🪝️ Could not save {provider} webhook for merchant {account_id}. {e}");
        }
        match provider {
            WebhookProvider::Flutterwave => self.handle_flutterwave(account_id, verif_hash, body).await.map(Some),
            WebhookProvider::Default => {
                debug!("🪝️ Ignoring webhook for merchant {account_id} from an unknown provider");
                Ok(None)
            },
        }
    }

    async fn handle_flutterwave(
        &self,
        account_id: i64,
        verif_hash: Option<&str>,
        body: &str,
    ) -> Result<Customer, MorApiError> {
        if let Some(expected) = &self.flutterwave_secret_hash {
            if verif_hash != Some(expected.reveal().as_str()) {
                warn!("🪝️ Rejecting Flutterwave webhook for merchant {account_id}. The secret hash does not match.");
                return Err(MorApiError::Unauthorized("Flutterwave secret hash mismatch".into()));
            }
        }
        let webhook = flutterwave::parse_webhook(body)?;
        let record = flutterwave::charge_record(account_id, webhook)?;
        let reference = record.payment.reference.clone();
        let customer = self.db.record_customer_payment(record.customer, record.payment).await?;
        info!(
            "🪝️ Flutterwave payment [{reference}] recorded for customer #{} of merchant {account_id}. {} payments so far",
            customer.id, customer.number_of_payments
        );
        Ok(customer)
    }
}
