use gloo::storage::errors::StorageError;
use gloo::storage::{LocalStorage, Storage};

use crate::domain::chart::visibility::SETTINGS_STORAGE_KEY;
use crate::domain::chart::{ChartSettings, SettingsStore};
use crate::domain::errors::{AppError, AppResult};

/// Settings blob in `window.localStorage`
#[derive(Debug, Clone)]
pub struct LocalSettingsStore {
    key: &'static str,
}

impl Default for LocalSettingsStore {
    fn default() -> Self {
        Self { key: SETTINGS_STORAGE_KEY }
    }
}

impl LocalSettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for LocalSettingsStore {
    fn load(&self) -> AppResult<Option<ChartSettings>> {
        match LocalStorage::get::<ChartSettings>(self.key) {
            Ok(settings) => Ok(Some(settings)),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(AppError::StorageError(e.to_string())),
        }
    }

    fn save(&self, settings: &ChartSettings) -> AppResult<()> {
        LocalStorage::set(self.key, settings).map_err(|e| AppError::StorageError(e.to_string()))
    }
}
