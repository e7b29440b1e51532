use crate::{
    db_types::{SaveSetting, Setting},
    mor_api::query_objects::{Paginated, Pagination, SettingsFilter},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait SettingsManagement {
    /// Fetches the setting for the given merchant account. Returns `None` if the merchant has never saved a setting.
    async fn fetch_setting_for_account(&self, account_id: i64) -> Result<Option<Setting>, StorageError>;

    async fn fetch_setting_by_id(&self, id: i64) -> Result<Option<Setting>, StorageError>;

    /// Creates the setting for `setting.account_id` if it does not exist, otherwise overwrites every mutable field.
    /// Returns the stored record.
    async fn save_setting(&self, setting: SaveSetting) -> Result<Setting, StorageError>;

    /// Lists settings, newest first.
    async fn search_settings(
        &self,
        filter: SettingsFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Setting>, StorageError>;
}
