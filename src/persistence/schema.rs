//! `SQLite` schema bootstrap logic.
//!
//! All definitions use `IF NOT EXISTS` and are safe to re-run on every
//! startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table and index definitions to the connected database.
///
/// The partial unique index on `task(channel) WHERE status = 'in_progress'`
/// makes a second in-flight task per channel unrepresentable.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS channel (
    name            TEXT PRIMARY KEY NOT NULL,
    enabled         INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS channel_setting (
    channel         TEXT NOT NULL,
    kind            TEXT NOT NULL CHECK(kind IN ('OPEN_AI_API_KEY','STREAM_DJ_ID','STREAM_DJ_LINK')),
    value           TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    PRIMARY KEY (channel, kind)
);

CREATE TABLE IF NOT EXISTS task (
    id              TEXT PRIMARY KEY NOT NULL,
    channel         TEXT NOT NULL,
    text            TEXT NOT NULL,
    username        TEXT,
    submitter       TEXT NOT NULL,
    status          TEXT NOT NULL CHECK(status IN ('queued','in_progress','finished')),
    response        TEXT,
    created_at      TEXT NOT NULL,
    finished_at     TEXT
);

CREATE TABLE IF NOT EXISTS history_message (
    id              TEXT PRIMARY KEY NOT NULL,
    channel         TEXT NOT NULL,
    username        TEXT NOT NULL,
    role            TEXT NOT NULL CHECK(role IN ('user','assistant')),
    content         TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_task_channel_status ON task(channel, status, created_at);
CREATE UNIQUE INDEX IF NOT EXISTS idx_task_single_in_progress
    ON task(channel) WHERE status = 'in_progress';
CREATE INDEX IF NOT EXISTS idx_history_channel_user ON history_message(channel, username, created_at);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
