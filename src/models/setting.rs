//! Per-channel setting kinds.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of per-channel setting kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettingKind {
    /// Credential for the answer-generation provider.
    OpenAiApiKey,
    /// Numeric StreamDJ channel identifier.
    StreamDjId,
    /// Public StreamDJ profile link.
    StreamDjLink,
}

impl SettingKind {
    /// Every kind, in the order shown to users.
    pub const ALL: [Self; 3] = [Self::OpenAiApiKey, Self::StreamDjId, Self::StreamDjLink];

    /// Column value persisted in `SQLite` and accepted by `!config`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAiApiKey => "OPEN_AI_API_KEY",
            Self::StreamDjId => "STREAM_DJ_ID",
            Self::StreamDjLink => "STREAM_DJ_LINK",
        }
    }
}

impl Display for SettingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| format!("unknown setting kind: {raw}"))
    }
}
