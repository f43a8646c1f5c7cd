//! In-memory settings store for tests and embedders without a data dir.

use anyhow::Result;
use tokio::sync::Mutex;

use super::{Settings, SettingsPatch, SettingsStore};
use crate::error::FetchError;

#[derive(Default)]
pub struct MemorySettingsStore {
    record: Mutex<Option<SettingsPatch>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that starts out holding `patch` as its saved record.
    pub fn with_record(patch: SettingsPatch) -> Self {
        Self {
            record: Mutex::new(Some(patch)),
        }
    }
}

#[async_trait::async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Option<SettingsPatch>, FetchError> {
        Ok(self.record.lock().await.clone())
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        let patch = SettingsPatch {
            currency: Some(settings.currency.clone()),
            block_explorer: Some(settings.block_explorer),
            tokens: Some(settings.tokens.clone()),
            theme: Some(settings.theme),
            language: Some(settings.language.clone()),
            sound_enabled: Some(settings.sound_enabled),
        };
        *self.record.lock().await = Some(patch);
        Ok(())
    }
}
