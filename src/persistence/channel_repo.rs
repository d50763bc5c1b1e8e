//! Channel repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::Utc;

use crate::models::channel::Channel;
use crate::Result;

use super::db::{parse_timestamp, timestamp, Database};

/// Repository for joined channel records.
#[derive(Clone)]
pub struct ChannelRepo {
    db: Arc<Database>,
}

#[derive(sqlx::FromRow)]
struct ChannelRow {
    name: String,
    enabled: i64,
    created_at: String,
}

impl ChannelRow {
    fn into_channel(self) -> Result<Channel> {
        Ok(Channel {
            name: self.name,
            enabled: self.enabled != 0,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

impl ChannelRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a channel unless one with the same name exists.
    ///
    /// Returns `true` when a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails.
    pub async fn insert_if_absent(&self, channel: &Channel) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO channel (name, enabled, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(&channel.name)
        .bind(i64::from(channel.enabled))
        .bind(timestamp(channel.created_at))
        .execute(self.db.as_ref())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// List enabled channels ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_enabled(&self) -> Result<Vec<Channel>> {
        let rows: Vec<ChannelRow> = sqlx::query_as(
            "SELECT name, enabled, created_at FROM channel WHERE enabled = 1 ORDER BY name ASC",
        )
        .fetch_all(self.db.as_ref())
        .await?;
        rows.into_iter().map(ChannelRow::into_channel).collect()
    }

    /// Enable or disable a channel; returns whether it exists.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE channel SET enabled = ?2 WHERE name = ?1")
            .bind(name)
            .bind(i64::from(enabled))
            .execute(self.db.as_ref())
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Apply a change of the configured channel list.
    ///
    /// Names new in `next` are inserted (or re-enabled); names dropped
    /// since `previous` are disabled. Channels never named by either list
    /// are left alone. Returns the enabled channel names afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any write fails; nothing is applied then.
    pub async fn apply_list_change(
        &self,
        previous: &[String],
        next: &[String],
    ) -> Result<Vec<String>> {
        let mut tx = self.db.begin().await?;
        for name in next.iter().filter(|name| !previous.contains(name)) {
            sqlx::query(
                "INSERT INTO channel (name, enabled, created_at) VALUES (?1, 1, ?2)
                 ON CONFLICT(name) DO UPDATE SET enabled = 1",
            )
            .bind(name)
            .bind(timestamp(Utc::now()))
            .execute(&mut *tx)
            .await?;
        }
        for name in previous.iter().filter(|name| !next.contains(name)) {
            sqlx::query("UPDATE channel SET enabled = 0 WHERE name = ?1")
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(self
            .list_enabled()
            .await?
            .into_iter()
            .map(|channel| channel.name)
            .collect())
    }
}
