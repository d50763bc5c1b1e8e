//! Conversation history kept per channel and user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a history entry, in chat-completions terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// Question asked by the chat user.
    User,
    /// Answer produced by the generator.
    Assistant,
}

impl ChatRole {
    /// Column value persisted in `SQLite`; also the API role name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse a persisted column value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// One turn of a user's conversation with the generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryMessage {
    /// Unique record identifier.
    pub id: String,
    /// Normalized channel name.
    pub channel: String,
    /// Chat login the conversation belongs to.
    pub username: String,
    /// Author of this turn.
    pub role: ChatRole,
    /// Message body.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl HistoryMessage {
    /// Construct a new history entry with a generated identifier.
    #[must_use]
    pub fn new(channel: String, username: String, role: ChatRole, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            channel,
            username,
            role,
            content,
            created_at: Utc::now(),
        }
    }
}
