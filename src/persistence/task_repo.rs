//! Generation task repository for `SQLite` persistence.
//!
//! Every status change is a conditional `UPDATE` evaluated against the
//! current row state, so callers can race freely: a transition that is no
//! longer valid simply affects zero rows.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::task::{Task, TaskStatus};
use crate::models::user::ChatUser;
use crate::{AppError, Result};

use super::db::{parse_timestamp, timestamp, Database};

const TASK_COLUMNS: &str = "id, channel, text, submitter, status, response, created_at";

/// Repository for generation task records.
#[derive(Clone)]
pub struct TaskRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    channel: String,
    text: String,
    submitter: String,
    status: String,
    response: Option<String>,
    created_at: String,
}

impl TaskRow {
    fn into_task(self) -> Result<Task> {
        let status = TaskStatus::parse(&self.status)
            .ok_or_else(|| AppError::Db(format!("invalid task status: {}", self.status)))?;
        let submitter: ChatUser = serde_json::from_str(&self.submitter)?;

        Ok(Task {
            id: self.id,
            channel: self.channel,
            text: self.text,
            submitter,
            status,
            response: self.response,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

impl TaskRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new task record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn insert(&self, task: &Task) -> Result<Task> {
        let submitter = serde_json::to_string(&task.submitter)?;

        sqlx::query(
            "INSERT INTO task (id, channel, text, username, submitter, status, response, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&task.id)
        .bind(&task.channel)
        .bind(&task.text)
        .bind(&task.submitter.username)
        .bind(&submitter)
        .bind(task.status.as_str())
        .bind(&task.response)
        .bind(timestamp(task.created_at))
        .execute(self.db.as_ref())
        .await?;

        Ok(task.clone())
    }

    /// Insert `task` unless its submitter already holds `limit` open tasks
    /// in the channel.
    ///
    /// The count and the insert are one statement, so concurrent
    /// submissions from one user cannot overshoot the limit. Returns
    /// `false` when the task was not stored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn insert_within_limit(&self, task: &Task, limit: i64) -> Result<bool> {
        let submitter = serde_json::to_string(&task.submitter)?;

        let result = sqlx::query(
            "INSERT INTO task (id, channel, text, username, submitter, status, response, created_at)
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
             WHERE (
                 SELECT COUNT(*) FROM task
                 WHERE channel = ?2 AND username IS ?4 AND status != 'finished'
             ) < ?9",
        )
        .bind(&task.id)
        .bind(&task.channel)
        .bind(&task.text)
        .bind(&task.submitter.username)
        .bind(&submitter)
        .bind(task.status.as_str())
        .bind(&task.response)
        .bind(timestamp(task.created_at))
        .bind(limit)
        .execute(self.db.as_ref())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Retrieve a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the task does not exist.
    pub async fn get_by_id(&self, id: &str) -> Result<Task> {
        let query = format!("SELECT {TASK_COLUMNS} FROM task WHERE id = ?1");
        let row: Option<TaskRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.ok_or_else(|| AppError::NotFound(format!("task {id} not found")))?
            .into_task()
    }

    /// Oldest non-finished task of `channel`, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn oldest_pending(&self, channel: &str) -> Result<Option<Task>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM task
             WHERE channel = ?1 AND status != 'finished'
             ORDER BY created_at ASC, rowid ASC
             LIMIT 1"
        );
        let row: Option<TaskRow> = sqlx::query_as(&query)
            .bind(channel)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(TaskRow::into_task).transpose()
    }

    /// List every task of `channel` in drain order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_by_channel(&self, channel: &str) -> Result<Vec<Task>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM task
             WHERE channel = ?1
             ORDER BY created_at ASC, rowid ASC"
        );
        let rows: Vec<TaskRow> = sqlx::query_as(&query)
            .bind(channel)
            .fetch_all(self.db.as_ref())
            .await?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    /// Count non-finished tasks in `channel`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn count_pending(&self, channel: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM task WHERE channel = ?1 AND status != 'finished'",
        )
        .bind(channel)
        .fetch_one(self.db.as_ref())
        .await?;
        Ok(row.0)
    }

    /// Count non-finished tasks in `channel` submitted by `username`.
    ///
    /// Anonymous submitters (`None`) are counted together.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn count_pending_for_user(
        &self,
        channel: &str,
        username: Option<&str>,
    ) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM task
             WHERE channel = ?1 AND username IS ?2 AND status != 'finished'",
        )
        .bind(channel)
        .bind(username)
        .fetch_one(self.db.as_ref())
        .await?;
        Ok(row.0)
    }

    /// Count tasks of `channel` currently in progress.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn count_in_progress(&self, channel: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM task WHERE channel = ?1 AND status = 'in_progress'",
        )
        .bind(channel)
        .fetch_one(self.db.as_ref())
        .await?;
        Ok(row.0)
    }

    /// Claim a queued task for processing.
    ///
    /// Succeeds only while the task is still `queued` and no other task of
    /// the same channel is `in_progress`. Returns `false` when the claim
    /// lost against the current state.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn claim(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE task SET status = 'in_progress'
             WHERE id = ?1 AND status = 'queued'
               AND NOT EXISTS (
                   SELECT 1 FROM task AS other
                   WHERE other.channel = task.channel AND other.status = 'in_progress'
               )",
        )
        .bind(id)
        .execute(self.db.as_ref())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Store the response and finish an in-progress task.
    ///
    /// Returns `false` if the task was no longer in progress (for example,
    /// finished by recovery in the meantime).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn finish(&self, id: &str, response: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE task SET status = 'finished', response = ?2, finished_at = ?3
             WHERE id = ?1 AND status = 'in_progress'",
        )
        .bind(id)
        .bind(response)
        .bind(timestamp(Utc::now()))
        .execute(self.db.as_ref())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Finish every non-finished task of `channel`.
    ///
    /// Returns the number of rows transitioned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn finish_all_pending(&self, channel: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE task SET status = 'finished', finished_at = ?2
             WHERE channel = ?1 AND status != 'finished'",
        )
        .bind(channel)
        .bind(timestamp(Utc::now()))
        .execute(self.db.as_ref())
        .await?;
        Ok(result.rows_affected())
    }

    /// Finish tasks of `channel` left `in_progress` by a previous process.
    ///
    /// Returns the number of rows transitioned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn finish_in_progress(&self, channel: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE task SET status = 'finished', finished_at = ?2
             WHERE channel = ?1 AND status = 'in_progress'",
        )
        .bind(channel)
        .bind(timestamp(Utc::now()))
        .execute(self.db.as_ref())
        .await?;
        Ok(result.rows_affected())
    }

    /// Purge finished tasks completed before `before`.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn purge_finished(&self, before: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM task WHERE status = 'finished' AND finished_at < ?1",
        )
        .bind(timestamp(before))
        .execute(self.db.as_ref())
        .await?;
        Ok(result.rows_affected())
    }
}
