//! Per-channel setting repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::Utc;

use crate::models::setting::SettingKind;
use crate::Result;

use super::db::{timestamp, Database};

/// Repository for `(channel, kind) → value` setting records.
#[derive(Clone)]
pub struct SettingRepo {
    db: Arc<Database>,
}

impl SettingRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Fetch the value stored for `channel` and `kind`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get(&self, channel: &str, kind: SettingKind) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM channel_setting WHERE channel = ?1 AND kind = ?2")
                .bind(channel)
                .bind(kind.as_str())
                .fetch_optional(self.db.as_ref())
                .await?;
        Ok(row.map(|(value,)| value))
    }

    /// Insert or replace the value for `channel` and `kind`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the upsert fails.
    pub async fn upsert(&self, channel: &str, kind: SettingKind, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO channel_setting (channel, kind, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(channel, kind) DO UPDATE SET value = excluded.value,
                                                      updated_at = excluded.updated_at",
        )
        .bind(channel)
        .bind(kind.as_str())
        .bind(value)
        .bind(timestamp(Utc::now()))
        .execute(self.db.as_ref())
        .await?;
        Ok(())
    }

    /// Remove the value for `channel` and `kind`; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn delete(&self, channel: &str, kind: SettingKind) -> Result<bool> {
        let result = sqlx::query("DELETE FROM channel_setting WHERE channel = ?1 AND kind = ?2")
            .bind(channel)
            .bind(kind.as_str())
            .execute(self.db.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
