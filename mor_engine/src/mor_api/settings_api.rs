//! Per-merchant settings: countries, settlement currencies, payment methods and verification documents.
use std::{collections::BTreeMap, fmt::Debug, str::FromStr};

use log::*;
use mor_common::mor_wallet;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{PaymentMethod, SaveSetting, Setting, SettingsCountry, SettingsVerification, VerificationStatus},
    gateway::{ExternalGateway, UserFilter, WalletBalance},
    mor_api::{
        currency_reconciliation::{normalize_currency_set, CurrencyReconciler},
        detail_objects::SettingDetails,
        enrichment::{Enricher, DEFAULT_ENRICHMENT_CONCURRENCY},
        errors::MorApiError,
        principal::Principal,
        query_objects::{Paginated, Pagination, SettingsFilter, SettingsSearch},
    },
    traits::{CustomerManagement, SettingsManagement},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationDocument {
    pub country_id: i64,
    pub document_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveSettingsRequest {
    pub countries: Vec<i64>,
    pub wallet_currency_codes: Vec<String>,
    pub business_type_id: i64,
    pub usage_type: String,
    pub documents: Vec<VerificationDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatusUpdate {
    pub country_id: i64,
    pub status: VerificationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethodAction {
    Enable,
    Disable,
}

impl FromStr for PaymentMethodAction {
    type Err = MorApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enable" => Ok(Self::Enable),
            "disable" => Ok(Self::Disable),
            _ => Err(MorApiError::validation(format!("'{s}' is not a payment method action. Use enable or disable."))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletAction {
    Add,
    Delete,
    Get,
}

impl FromStr for WalletAction {
    type Err = MorApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "delete" => Ok(Self::Delete),
            "get" => Ok(Self::Get),
            _ => Err(MorApiError::validation(format!("'{s}' is not a wallet action. Use add, delete or get."))),
        }
    }
}

pub type WalletMap = BTreeMap<String, WalletBalance>;

pub struct SettingsApi<B, G> {
    db: B,
    gateway: G,
    enrichment_concurrency: usize,
}

impl<B: Debug, G: Debug> Debug for SettingsApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettingsApi ({:?}, {:?})", self.db, self.gateway)
    }
}

impl<B, G> SettingsApi<B, G>
where
    B: SettingsManagement + CustomerManagement,
    G: ExternalGateway,
{
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway, enrichment_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY }
    }

    pub fn with_enrichment_concurrency(mut self, concurrency: usize) -> Self {
        self.enrichment_concurrency = concurrency;
        self
    }

    /// The caller's setting, or `None` if they have never saved one.
    pub async fn get_settings(&self, principal: &Principal) -> Result<Option<Setting>, MorApiError> {
        let setting = self.db.fetch_setting_for_account(principal.account_id).await?;
        Ok(setting)
    }

    async fn current_or_new(&self, account_id: i64) -> Result<SaveSetting, MorApiError> {
        let setting = self.db.fetch_setting_for_account(account_id).await?;
        Ok(setting.map(SaveSetting::from).unwrap_or_else(|| SaveSetting::new(account_id)))
    }

    /// Merges the request into the caller's setting, creating it if needed.
    ///
    /// * New country ids are resolved through the gateway. An unknown country fails the whole request.
    /// * Each wallet currency gets a settlement wallet. Wallet provisioning here is best effort.
    /// * Each document replaces the one for the same country and puts it back to `pending`.
    pub async fn save_settings(&self, principal: &Principal, req: SaveSettingsRequest) -> Result<Setting, MorApiError> {
        let account_id = principal.account_id;
        let mut setting = self.current_or_new(account_id).await?;

        for country_id in req.countries {
            if setting.countries.iter().any(|c| c.id == country_id) {
                continue;
            }
            let country = self
                .gateway
                .get_country_by_id(country_id)
                .await
                .map_err(|e| MorApiError::not_found(format!("Country with id {country_id} ({e})")))?;
            setting.countries.push(SettingsCountry {
                id: country_id,
                name: country.name,
                currency_code: country.currency_code,
            });
        }

        let reconciler = CurrencyReconciler::new(&self.gateway);
        for code in normalize_currency_set(&req.wallet_currency_codes) {
            if let Err(e) = reconciler.ensure_wallet(account_id, &code).await {
                warn!("💱️ Could not provision {} for account {account_id}. {e}", mor_wallet(&code));
            }
            if !setting.currency_codes.contains(&code) {
                setting.currency_codes.push(code);
            }
        }

        setting.business_type_id = req.business_type_id;
        setting.usage_type = req.usage_type;

        for doc in req.documents {
            match setting.verifications.iter_mut().find(|v| v.country_id == doc.country_id) {
                Some(existing) => {
                    existing.document_url = doc.document_url;
                    existing.status = VerificationStatus::Pending;
                },
                None => setting.verifications.push(SettingsVerification {
                    country_id: doc.country_id,
                    document_url: doc.document_url,
                    status: VerificationStatus::Pending,
                }),
            }
        }
        setting.is_verified = all_verified(&setting.verifications);

        let saved = self.db.save_setting(setting).await?;
        info!("⚙️ Settings saved for account {account_id}");
        Ok(saved)
    }

    pub async fn set_payment_methods(
        &self,
        principal: &Principal,
        action: PaymentMethodAction,
        methods: Vec<String>,
    ) -> Result<Setting, MorApiError> {
        let mut setting = self.current_or_new(principal.account_id).await?;
        let requested = methods.into_iter().map(PaymentMethod::new).filter(|m| !m.is_empty()).collect::<Vec<_>>();
        match action {
            PaymentMethodAction::Enable => {
                for method in requested {
                    if !setting.payment_methods.contains(&method) {
                        setting.payment_methods.push(method);
                    }
                }
            },
            PaymentMethodAction::Disable => setting.payment_methods.retain(|m| !requested.contains(m)),
        }
        let saved = self.db.save_setting(setting).await?;
        debug!("⚙️ Payment methods for account {} are now {:?}", saved.account_id, saved.payment_methods);
        Ok(saved)
    }

    /// Adds, removes or lists settlement wallets.
    ///
    /// `Add` and `Delete` persist the new currency set and return every wallet now held. If reconciliation fails
    /// part way, the partial currency set is still persisted before the error is returned.
    pub async fn manage_wallets(
        &self,
        principal: &Principal,
        action: WalletAction,
        currency_codes: Vec<String>,
    ) -> Result<WalletMap, MorApiError> {
        let account_id = principal.account_id;
        let reconciler = CurrencyReconciler::new(&self.gateway);
        if action == WalletAction::Get {
            return Ok(self.collect_wallets(&reconciler, account_id, &normalize_currency_set(&currency_codes)).await);
        }
        let mut setting = self.current_or_new(account_id).await?;
        let result = match action {
            WalletAction::Add => reconciler.add_currencies(account_id, &setting.currency_codes, &currency_codes).await,
            _ => reconciler.remove_currencies(account_id, &setting.currency_codes, &currency_codes).await,
        };
        match result {
            Ok(currencies) => {
                setting.currency_codes = currencies;
                let saved = self.db.save_setting(setting).await?;
                Ok(self.collect_wallets(&reconciler, account_id, &saved.currency_codes).await)
            },
            Err(MorApiError::Reconciliation { currency, currencies, source }) => {
                warn!("💱️ Saving partial currency set {currencies:?} for account {account_id} after failing on {currency}");
                setting.currency_codes = currencies.clone();
                self.db.save_setting(setting).await?;
                Err(MorApiError::Reconciliation { currency, currencies, source })
            },
            Err(e) => Err(e),
        }
    }

    async fn collect_wallets(
        &self,
        reconciler: &CurrencyReconciler<'_, G>,
        account_id: i64,
        codes: &[String],
    ) -> WalletMap {
        let mut wallets = WalletMap::new();
        for code in codes {
            match reconciler.ensure_wallet(account_id, code).await {
                Ok(wallet) => {
                    wallets.insert(mor_wallet(code), wallet);
                },
                Err(e) => warn!("💱️ Could not fetch {} for account {account_id}. {e}", mor_wallet(code)),
            }
        }
        wallets
    }

    /// Lists settings for admins. `search` matches merchants via the identity service.
    pub async fn list_settings(
        &self,
        search: SettingsSearch,
        pagination: Pagination,
    ) -> Result<Paginated<SettingDetails>, MorApiError> {
        let mut filter =
            SettingsFilter { is_verified: search.is_verified, from: search.from, to: search.to, ..Default::default() };
        if let Some(term) = search.search.filter(|s| !s.trim().is_empty()) {
            let users = self.gateway.get_users(UserFilter::verified_matching(term)).await?;
            filter.account_ids = Some(users.into_iter().map(|u| u.account_id).collect());
        }
        let page = self.db.search_settings(filter, pagination).await?;
        let enricher = Enricher::new(&self.db, &self.gateway, self.enrichment_concurrency);
        let items = enricher.settings(page.items.clone()).await;
        Ok(page.with_items(items))
    }

    /// Sets the status of one country's verification document. Once every document is verified, the merchant's
    /// MOR account is switched on.
    pub async fn update_document_status(
        &self,
        setting_id: i64,
        update: DocumentStatusUpdate,
    ) -> Result<Setting, MorApiError> {
        let setting = self
            .db
            .fetch_setting_by_id(setting_id)
            .await?
            .ok_or_else(|| MorApiError::not_found(format!("Setting #{setting_id}")))?;
        let mut setting = SaveSetting::from(setting);
        let verification = setting
            .verifications
            .iter_mut()
            .find(|v| v.country_id == update.country_id)
            .ok_or_else(|| MorApiError::not_found(format!("Verification for country {}", update.country_id)))?;
        verification.status = update.status;
        setting.is_verified = all_verified(&setting.verifications);
        let account_id = setting.account_id;
        let saved = self.db.save_setting(setting).await?;
        if saved.is_verified {
            info!("⚙️ All documents for account {account_id} are verified. Enabling MOR.");
            self.gateway.toggle_mor_status(account_id, true).await?;
        }
        Ok(saved)
    }
}

fn all_verified(verifications: &[SettingsVerification]) -> bool {
    !verifications.is_empty() && verifications.iter().all(|v| v.status == VerificationStatus::Verified)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn actions() {
        assert_eq!("Enable".parse::<PaymentMethodAction>().unwrap(), PaymentMethodAction::Enable);
        assert_eq!("DISABLE".parse::<PaymentMethodAction>().unwrap(), PaymentMethodAction::Disable);
        assert!(matches!("toggle".parse::<PaymentMethodAction>(), Err(MorApiError::Validation(_))));
        assert_eq!("delete".parse::<WalletAction>().unwrap(), WalletAction::Delete);
        assert!(matches!("remove".parse::<WalletAction>(), Err(MorApiError::Validation(_))));
    }

    #[test]
    fn verification_aggregate() {
        let v = |status| SettingsVerification { country_id: 1, document_url: "x".into(), status };
        assert!(!all_verified(&[]));
        assert!(all_verified(&[v(VerificationStatus::Verified)]));
        assert!(!all_verified(&[v(VerificationStatus::Verified), v(VerificationStatus::Pending)]));
    }
}
