//! Joined chat channel model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat room the bot may join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    /// Normalized channel name (no `#`, lower-case).
    pub name: String,
    /// Whether the bot joins this channel on connect.
    pub enabled: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Channel {
    /// Construct an enabled channel record.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: normalize_channel(name),
            enabled: true,
            created_at: Utc::now(),
        }
    }
}

/// Strip the IRC-style `#` prefix and lower-case a channel name.
#[must_use]
pub fn normalize_channel(raw: &str) -> String {
    raw.trim().trim_start_matches('#').to_lowercase()
}
