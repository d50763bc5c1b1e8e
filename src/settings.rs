//! Typed access to per-channel settings.

use std::sync::Arc;

use crate::models::setting::SettingKind;
use crate::persistence::db::Database;
use crate::persistence::setting_repo::SettingRepo;
use crate::Result;

/// Resolves per-channel settings by kind.
#[derive(Clone)]
pub struct ChannelSettings {
    repo: SettingRepo,
}

impl ChannelSettings {
    /// Create a resolver over the shared database.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            repo: SettingRepo::new(db),
        }
    }

    /// Generation credential of `channel`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the lookup fails.
    pub async fn openai_api_key(&self, channel: &str) -> Result<Option<String>> {
        self.get(channel, SettingKind::OpenAiApiKey).await
    }

    /// StreamDJ channel id of `channel`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the lookup fails.
    pub async fn stream_dj_id(&self, channel: &str) -> Result<Option<String>> {
        self.get(channel, SettingKind::StreamDjId).await
    }

    /// Public StreamDJ link of `channel`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the lookup fails.
    pub async fn stream_dj_link(&self, channel: &str) -> Result<Option<String>> {
        self.get(channel, SettingKind::StreamDjLink).await
    }

    /// Store `value` for `kind`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn set(&self, channel: &str, kind: SettingKind, value: &str) -> Result<()> {
        self.repo.upsert(channel, kind, value).await
    }

    /// Remove the value for `kind`; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn unset(&self, channel: &str, kind: SettingKind) -> Result<bool> {
        self.repo.delete(channel, kind).await
    }

    // Blank values count as unset.
    async fn get(&self, channel: &str, kind: SettingKind) -> Result<Option<String>> {
        Ok(self
            .repo
            .get(channel, kind)
            .await?
            .filter(|value| !value.trim().is_empty()))
    }
}
