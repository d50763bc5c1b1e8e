//! Chat sender metadata carried with messages and persisted with tasks.

use serde::{Deserialize, Serialize};

/// Badge that identifies the channel owner.
pub const BROADCASTER_BADGE: &str = "broadcaster";

/// Sender context delivered by the chat gateway.
///
/// Persisted verbatim as the task's submitter blob so that deferred
/// replies can still mention the original sender after a restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatUser {
    /// Login name, when the network provides one.
    pub username: Option<String>,
    /// Display name shown in chat.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Identifier of the message being answered, for threaded replies.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Badges attached to the sender (e.g. `broadcaster`, `moderator`).
    #[serde(default)]
    pub badges: Vec<String>,
}

impl ChatUser {
    /// Build a sender with only a login name.
    #[must_use]
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// Whether the sender owns the channel.
    #[must_use]
    pub fn is_broadcaster(&self) -> bool {
        self.badges.iter().any(|badge| badge == BROADCASTER_BADGE)
    }

    /// Name used to mention the sender in replies.
    #[must_use]
    pub fn mention_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .filter(|name| !name.is_empty())
    }
}
