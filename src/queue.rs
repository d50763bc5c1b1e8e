//! Durable per-channel queue for long-running answer generation.
//!
//! Tasks move `queued → in_progress → finished`. The drain loop re-reads
//! the channel's oldest non-finished task before every step and claims it
//! with a conditional update, so concurrent drains of one channel never
//! process two tasks at once and a restart never loses queued work.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::chunker::split_response;
use crate::config::QueueConfig;
use crate::gateway::ChatGateway;
use crate::models::history::{ChatRole, HistoryMessage};
use crate::models::task::{Task, TaskStatus};
use crate::models::user::ChatUser;
use crate::persistence::db::Database;
use crate::persistence::history_repo::HistoryRepo;
use crate::persistence::task_repo::TaskRepo;
use crate::services::Generator;
use crate::settings::ChannelSettings;
use crate::{AppError, Result};

/// Reply when a user already holds the maximum number of open tasks.
pub const FLOOD_REJECTED: &str = "Вы задаёте слишком много вопросов!";
/// Reply when a task lands behind others.
pub const QUEUED_NOTICE: &str = "Ваш вопрос добавлен в очередь";
/// Reply when the channel has no generation credential.
pub const NO_CREDENTIAL: &str = "Для этого канала не указан OpenAI API ключ";
/// Reply when a task is claimed.
pub const ANSWERING: &str = "Отвечаю...";
/// Reply after history was deleted.
pub const HISTORY_CLEARED: &str = "История очищена";
/// Reply when there was no history to delete.
pub const HISTORY_EMPTY: &str = "История уже пуста";

/// Per-channel generation queue engine.
pub struct TaskQueue {
    tasks: TaskRepo,
    history: HistoryRepo,
    settings: ChannelSettings,
    generator: Arc<dyn Generator>,
    gateway: Arc<dyn ChatGateway>,
    flood_limit: i64,
    chunk_size: usize,
}

impl TaskQueue {
    /// Create a queue engine over the shared database.
    #[must_use]
    pub fn new(
        db: Arc<Database>,
        gateway: Arc<dyn ChatGateway>,
        generator: Arc<dyn Generator>,
        config: &QueueConfig,
    ) -> Self {
        Self {
            tasks: TaskRepo::new(Arc::clone(&db)),
            history: HistoryRepo::new(Arc::clone(&db)),
            settings: ChannelSettings::new(db),
            generator,
            gateway,
            flood_limit: i64::from(config.flood_limit),
            chunk_size: config.chunk_size,
        }
    }

    /// Enqueue a question from `submitter` and drain the channel.
    ///
    /// A submitter at the flood limit is rejected; the drain still runs.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the queue cannot be read or written.
    pub async fn submit(&self, channel: &str, text: &str, submitter: &ChatUser) -> Result<()> {
        let username = submitter.username.as_deref();
        let ahead = self.tasks.count_pending(channel).await?;

        let task = Task::new(channel.to_owned(), text.to_owned(), submitter.clone());
        if !self.tasks.insert_within_limit(&task, self.flood_limit).await? {
            info!(channel, username, "submission rejected by flood control");
            self.notify(channel, FLOOD_REJECTED, submitter).await;
            return self.drain(channel).await;
        }
        info!(channel, task_id = %task.id, username, "task queued");

        if ahead > 0 {
            self.notify(channel, QUEUED_NOTICE, submitter).await;
        }

        self.drain(channel).await
    }

    /// Process the channel's backlog until it is empty or blocked.
    ///
    /// Stops without changes when the head task is already in progress.
    /// A missing credential finishes every open task of the channel.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a queue read or transition fails.
    pub async fn drain(&self, channel: &str) -> Result<()> {
        loop {
            let Some(task) = self.tasks.oldest_pending(channel).await? else {
                debug!(channel, "queue empty");
                return Ok(());
            };
            if !task.can_transition_to(TaskStatus::InProgress) {
                debug!(channel, task_id = %task.id, "head task already in progress");
                return Ok(());
            }

            let Some(credential) = self.settings.openai_api_key(channel).await? else {
                self.notify(channel, NO_CREDENTIAL, &task.submitter).await;
                let finished = self.tasks.finish_all_pending(channel).await?;
                warn!(channel, finished, "no generation credential, open tasks finished");
                return Ok(());
            };

            if !self.tasks.claim(&task.id).await? {
                debug!(channel, task_id = %task.id, "claim lost to a concurrent drain");
                return Ok(());
            }
            info!(channel, task_id = %task.id, "task claimed");
            self.notify(channel, ANSWERING, &task.submitter).await;

            match self.complete(&task, &credential).await {
                Ok(true) => info!(channel, task_id = %task.id, "task finished"),
                Ok(false) => warn!(channel, task_id = %task.id, "task was finished concurrently"),
                Err(err) => {
                    // The claim is only released by `recover` on the next join.
                    error!(channel, task_id = %task.id, %err, "task stranded in progress");
                    return Err(err);
                }
            }
        }
    }

    /// Answer a claimed task, deliver the segments and mark it finished.
    async fn complete(&self, task: &Task, credential: &str) -> Result<bool> {
        let response = self.answer(task, credential).await?;
        for segment in split_response(&response, self.chunk_size) {
            self.notify(&task.channel, &segment, &task.submitter).await;
        }
        self.tasks.finish(&task.id, &response).await
    }

    /// Finish tasks orphaned by a previous process, then drain.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the transition or the drain fails.
    pub async fn recover(&self, channel: &str) -> Result<()> {
        let recovered = self.tasks.finish_in_progress(channel).await?;
        info!(channel, recovered, "recovered in-progress tasks");
        self.drain(channel).await
    }

    /// Delete the conversation of `username` in `channel`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn clear_history(&self, channel: &str, username: &str) -> Result<&'static str> {
        let deleted = self.history.clear(channel, username).await?;
        info!(channel, username, deleted, "history cleared");
        Ok(if deleted == 0 {
            HISTORY_EMPTY
        } else {
            HISTORY_CLEARED
        })
    }

    /// Generate the answer for `task`; provider failures become the answer.
    async fn answer(&self, task: &Task, credential: &str) -> Result<String> {
        let username = task.submitter.username.as_deref();
        let history = match username {
            Some(name) => self.history.list(&task.channel, name).await?,
            None => Vec::new(),
        };

        match self
            .generator
            .generate(credential, &task.text, &history)
            .await
        {
            Ok(answer) => {
                if let Some(name) = username {
                    self.history
                        .append(&[
                            HistoryMessage::new(
                                task.channel.clone(),
                                name.to_owned(),
                                ChatRole::User,
                                task.text.clone(),
                            ),
                            HistoryMessage::new(
                                task.channel.clone(),
                                name.to_owned(),
                                ChatRole::Assistant,
                                answer.clone(),
                            ),
                        ])
                        .await?;
                }
                Ok(answer)
            }
            Err(err) => {
                warn!(channel = %task.channel, task_id = %task.id, %err, "generation failed");
                let message = match err {
                    AppError::Generation(message) => message,
                    other => other.to_string(),
                };
                Ok(format!("Ошибка: {message}"))
            }
        }
    }

    // Replies are best effort; a failed send never blocks the queue.
    async fn notify(&self, channel: &str, text: &str, to: &ChatUser) {
        if let Err(err) = self.gateway.reply(channel, text, to).await {
            warn!(channel, %err, "failed to deliver reply");
        }
    }
}
