// Settings Reader - one read of the settings area per tick

use std::sync::Arc;

use tracing::warn;

use crate::domain::Settings;
use crate::error::{AppError, Result};
use crate::port::KeyValueStore;

pub struct SettingsReader {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsReader {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current settings. A failed read yields the defaults.
    pub async fn load(&self) -> Settings {
        match self.store.get_all().await {
            Ok(values) => Settings::from_values(&values),
            Err(e) => {
                warn!(error = %e, "Settings read failed, using defaults");
                Settings::default()
            }
        }
    }

    /// Raw values of every known setting that is present
    pub async fn raw(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        Ok(self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(|(key, _)| Settings::is_known_key(key))
            .collect())
    }

    /// Validate and write one setting
    pub async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        Settings::validate_value(key, &value).map_err(AppError::Validation)?;
        self.store.set(key, value).await
    }

    /// Drop one setting back to its default
    pub async fn reset(&self, key: &str) -> Result<()> {
        if !Settings::is_known_key(key) {
            return Err(AppError::Validation(format!("unknown setting: {}", key)));
        }
        self.store.remove(key).await
    }
}
