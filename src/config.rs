//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name under which runtime secrets are stored.
const KEYRING_SERVICE: &str = "chat-commander";

/// Bot identity used when connecting to the chat network.
///
/// The OAuth token is loaded at runtime via OS keychain or environment
/// variables, never from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BotConfig {
    /// Login name of the bot account. Also the fallback DJ track author.
    pub username: String,
    /// OAuth token for the chat network (populated at runtime).
    #[serde(skip)]
    pub oauth_token: String,
}

/// Task queue tuning.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct QueueConfig {
    /// Maximum non-finished tasks a single user may hold in one channel.
    #[serde(default = "default_flood_limit")]
    pub flood_limit: u32,
    /// Maximum characters per outgoing chat message.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            flood_limit: default_flood_limit(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_flood_limit() -> u32 {
    3
}

fn default_chunk_size() -> usize {
    crate::chunker::MAX_SEGMENT_CHARS
}

/// OpenAI-compatible generation endpoint settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Base URL of the chat-completions API (without `/chat/completions`).
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout; a hung provider only stalls its own channel this long.
    #[serde(default = "default_generation_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: default_generation_timeout(),
        }
    }
}

fn default_generation_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_generation_timeout() -> u64 {
    120
}

/// StreamDJ playlist service endpoints.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PlaylistConfig {
    /// Read API (`get_track`, `playlist`).
    #[serde(default = "default_playlist_api")]
    pub api_base_url: String,
    /// Application host serving the `add_track` form endpoint.
    #[serde(default = "default_playlist_app")]
    pub app_base_url: String,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_playlist_api(),
            app_base_url: default_playlist_app(),
        }
    }
}

fn default_playlist_api() -> String {
    "https://streamdj.ru/api".into()
}

fn default_playlist_app() -> String {
    "https://streamdj.app".into()
}

/// Video search endpoint settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct VideoSearchConfig {
    /// YouTube Data API base URL.
    #[serde(default = "default_video_search_base")]
    pub base_url: String,
    /// API key (populated at runtime; optional).
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for VideoSearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_video_search_base(),
            api_key: None,
        }
    }
}

fn default_video_search_base() -> String {
    "https://www.googleapis.com/youtube/v3".into()
}

fn default_retention_days() -> u32 {
    30
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Path of the `SQLite` database file.
    pub database_path: PathBuf,
    /// Chat identity.
    pub bot: BotConfig,
    /// Channels inserted as enabled on startup if not already known.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Queue tuning.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Generation provider.
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Playlist service.
    #[serde(default)]
    pub playlist: PlaylistConfig,
    /// Video search service.
    #[serde(default)]
    pub video_search: VideoSearchConfig,
    /// Days after which finished tasks are purged.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load runtime secrets from OS keychain with env-var fallback.
    ///
    /// The bot OAuth token is required; the YouTube API key is optional and
    /// only disables free-text `!dj add` searches when absent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the OAuth token cannot be found.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.bot.oauth_token = load_credential("bot_oauth_token", "BOT_OAUTH_TOKEN").await?;
        self.video_search.api_key = load_credential("youtube_api_key", "YOUTUBE_API_KEY")
            .await
            .ok();
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.bot.username.trim().is_empty() {
            return Err(AppError::Config("bot.username must not be empty".into()));
        }

        if self.queue.flood_limit == 0 {
            return Err(AppError::Config(
                "queue.flood_limit must be greater than zero".into(),
            ));
        }

        if self.queue.chunk_size == 0 {
            return Err(AppError::Config(
                "queue.chunk_size must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    env::var(env_key)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::Config(format!(
                "credential {keyring_key} not found in keychain or {env_key} env var"
            ))
        })
}
