//! Hot-reload watcher for the channel list in `config.toml`.
//!
//! [`ChannelWatcher`] uses the `notify` crate to watch the config file.
//! On change it re-parses only the top-level `channels` array and publishes
//! the normalized list on a [`tokio::sync::watch`] channel. Every other
//! field still requires a restart.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::models::channel::normalize_channel;
use crate::{AppError, Result};

/// Minimal TOML structure used for hot-reload parsing.
#[derive(Debug, Deserialize)]
struct ChannelsOnlyConfig {
    #[serde(default)]
    channels: Vec<String>,
}

/// Parse and normalize only the `channels` array from a TOML file.
///
/// Unknown fields are ignored. Duplicates and blank names are dropped,
/// preserving first-seen order.
///
/// # Errors
///
/// Returns `AppError::Config` if the file cannot be read or parsed.
pub fn parse_channel_list(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| AppError::Config(format!("failed to read config for reload: {err}")))?;
    let parsed: ChannelsOnlyConfig = toml::from_str(&raw)
        .map_err(|err| AppError::Config(format!("failed to parse channel list: {err}")))?;

    let mut channels: Vec<String> = Vec::with_capacity(parsed.channels.len());
    for name in parsed.channels.iter().map(|c| normalize_channel(c)) {
        if !name.is_empty() && !channels.contains(&name) {
            channels.push(name);
        }
    }
    Ok(channels)
}

fn is_config_change(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Watches the config file and publishes channel-list changes.
///
/// Dropping the watcher stops the OS watch.
pub struct ChannelWatcher {
    _watcher: RecommendedWatcher,
    channels: watch::Receiver<Vec<String>>,
}

impl ChannelWatcher {
    /// Start watching `config_path`, seeded with `initial`.
    ///
    /// A reload that fails to parse keeps the previous list. Receivers are
    /// only woken when the list actually changes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the OS watcher cannot be created.
    pub fn new(config_path: &Path, initial: Vec<String>) -> Result<Self> {
        let (tx, channels) = watch::channel(initial);
        let path: PathBuf = config_path.to_path_buf();

        let mut watcher = notify::recommended_watcher(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) if is_config_change(&event) => match parse_channel_list(&path) {
                    Ok(next) => {
                        let changed = tx.send_if_modified(|current| {
                            if *current == next {
                                return false;
                            }
                            current.clone_from(&next);
                            true
                        });
                        if changed {
                            info!(path = %path.display(), channels = ?next, "channel list reloaded");
                        }
                    }
                    Err(err) => {
                        warn!(%err, path = %path.display(), "channel reload failed, keeping previous list");
                    }
                },
                Err(err) => warn!(%err, "config file watcher error"),
                _ => {}
            },
        )
        .map_err(|err| AppError::Config(format!("failed to create config file watcher: {err}")))?;

        // Watch the parent directory so rename-based saves are seen.
        let target = config_path
            .parent()
            .filter(|p| p != &Path::new(""))
            .unwrap_or(config_path);
        watcher
            .watch(target, RecursiveMode::NonRecursive)
            .map_err(|err| {
                AppError::Config(format!(
                    "failed to watch config path '{}': {err}",
                    target.display()
                ))
            })?;

        info!(path = %config_path.display(), "config watcher started for channel reload");
        Ok(Self {
            _watcher: watcher,
            channels,
        })
    }

    /// A receiver for the current and future channel lists.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.channels.clone()
    }
}
