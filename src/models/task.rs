//! Generation task model and queue lifecycle helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::ChatUser;

/// Lifecycle status for a queued generation task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for the channel's drain loop.
    Queued,
    /// Claimed by the drain loop; at most one per channel.
    InProgress,
    /// Terminal state.
    Finished,
}

impl TaskStatus {
    /// Column value persisted in `SQLite`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
        }
    }

    /// Parse a persisted column value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "queued" => Some(Self::Queued),
            "in_progress" => Some(Self::InProgress),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

/// One durable request for long-running answer generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique record identifier (UUID v4 prefixed `task:`).
    pub id: String,
    /// Normalized channel name.
    pub channel: String,
    /// Question text forwarded to the generator.
    pub text: String,
    /// Chat user who submitted the question.
    pub submitter: ChatUser,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Generated answer (or error text) once finished.
    pub response: Option<String>,
    /// Creation timestamp; drain order within a channel.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Construct a new queued task with a generated identifier.
    #[must_use]
    pub fn new(channel: String, text: String, submitter: ChatUser) -> Self {
        Self {
            id: format!("task:{}", Uuid::new_v4()),
            channel,
            text,
            submitter,
            status: TaskStatus::Queued,
            response: None,
            created_at: Utc::now(),
        }
    }

    /// Determine whether a lifecycle transition is permitted.
    ///
    /// `Queued → Finished` covers the bulk finish on missing credentials;
    /// `Finished` never transitions again.
    #[must_use]
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self.status, next),
            (TaskStatus::Queued, TaskStatus::InProgress | TaskStatus::Finished)
                | (TaskStatus::InProgress, TaskStatus::Finished)
        )
    }
}
