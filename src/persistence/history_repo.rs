//! Conversation history repository for `SQLite` persistence.

use std::sync::Arc;

use crate::models::history::{ChatRole, HistoryMessage};
use crate::{AppError, Result};

use super::db::{parse_timestamp, timestamp, Database};

/// Repository for per-channel, per-user conversation history.
#[derive(Clone)]
pub struct HistoryRepo {
    db: Arc<Database>,
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: String,
    channel: String,
    username: String,
    role: String,
    content: String,
    created_at: String,
}

impl HistoryRow {
    fn into_message(self) -> Result<HistoryMessage> {
        let role = ChatRole::parse(&self.role)
            .ok_or_else(|| AppError::Db(format!("invalid history role: {}", self.role)))?;
        Ok(HistoryMessage {
            id: self.id,
            channel: self.channel,
            username: self.username,
            role,
            content: self.content,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

impl HistoryRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Conversation of `username` in `channel`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self, channel: &str, username: &str) -> Result<Vec<HistoryMessage>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT id, channel, username, role, content, created_at
             FROM history_message
             WHERE channel = ?1 AND username = ?2
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(channel)
        .bind(username)
        .fetch_all(self.db.as_ref())
        .await?;
        rows.into_iter().map(HistoryRow::into_message).collect()
    }

    /// Append messages atomically, preserving slice order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any insert fails; nothing is written then.
    pub async fn append(&self, messages: &[HistoryMessage]) -> Result<()> {
        let mut tx = self.db.begin().await?;
        for message in messages {
            sqlx::query(
                "INSERT INTO history_message (id, channel, username, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&message.id)
            .bind(&message.channel)
            .bind(&message.username)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(timestamp(message.created_at))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Delete the conversation of `username` in `channel`.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn clear(&self, channel: &str, username: &str) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM history_message WHERE channel = ?1 AND username = ?2")
                .bind(channel)
                .bind(username)
                .execute(self.db.as_ref())
                .await?;
        Ok(result.rows_affected())
    }
}
