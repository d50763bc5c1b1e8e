//! Routes gateway events to command handlers and the task queue.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::configure::configure;
use super::dj::DjHandler;
use super::simple::{self, AskOptions};
use super::{parse, Command, ParsedCommand};
use crate::config::GlobalConfig;
use crate::gateway::{ChatGateway, GatewayEvent};
use crate::models::user::ChatUser;
use crate::persistence::db::Database;
use crate::queue::TaskQueue;
use crate::services::{Generator, PlaylistService, VideoSearch};
use crate::settings::ChannelSettings;
use crate::Result;

/// External capabilities the dispatcher talks to.
pub struct Services {
    /// Answer generation for `!gpt`.
    pub generator: Arc<dyn Generator>,
    /// Playlist service for `!dj`.
    pub playlist: Arc<dyn PlaylistService>,
    /// Video search for `!dj add`.
    pub search: Arc<dyn VideoSearch>,
}

/// Top-level chat event handler.
pub struct Dispatcher {
    gateway: Arc<dyn ChatGateway>,
    queue: Arc<TaskQueue>,
    settings: ChannelSettings,
    dj: DjHandler,
}

impl Dispatcher {
    /// Wire handlers over the shared database and gateway.
    #[must_use]
    pub fn new(
        db: Arc<Database>,
        gateway: Arc<dyn ChatGateway>,
        services: Services,
        config: &GlobalConfig,
    ) -> Self {
        let settings = ChannelSettings::new(Arc::clone(&db));
        let queue = TaskQueue::new(
            db,
            Arc::clone(&gateway),
            services.generator,
            &config.queue,
        );
        let dj = DjHandler::new(
            services.playlist,
            services.search,
            settings.clone(),
            config.bot.username.clone(),
        );

        Self {
            gateway,
            queue: Arc::new(queue),
            settings,
            dj,
        }
    }

    /// The queue engine behind `!gpt`.
    #[must_use]
    pub fn queue(&self) -> &Arc<TaskQueue> {
        &self.queue
    }

    /// Handle one gateway event; errors are logged, never returned.
    pub async fn handle(&self, event: GatewayEvent) {
        let outcome = match event {
            GatewayEvent::Join {
                channel,
                is_self: true,
                ..
            } => self.queue.recover(&channel).await,
            GatewayEvent::Join { .. } => Ok(()),
            GatewayEvent::Message {
                channel,
                sender,
                text,
                is_self,
            } => {
                if is_self {
                    return;
                }
                self.handle_message(&channel, &sender, &text).await
            }
        };

        if let Err(err) = outcome {
            error!(%err, "command handling failed");
        }
    }

    /// Consume `events`, handling each on its own task, until cancelled.
    #[must_use]
    pub fn spawn_event_loop(
        self: Arc<Self>,
        mut events: mpsc::Receiver<GatewayEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    () = cancel.cancelled() => {
                        info!("event loop shutting down");
                        break;
                    }
                    maybe_event = events.recv() => {
                        if let Some(event) = maybe_event { event } else {
                            info!("gateway event stream closed");
                            break;
                        }
                    }
                };

                let dispatcher = Arc::clone(&self);
                tokio::spawn(async move { dispatcher.handle(event).await });
            }
        })
    }

    async fn handle_message(&self, channel: &str, sender: &ChatUser, text: &str) -> Result<()> {
        let Some(parsed) = parse(text) else {
            return Ok(());
        };
        debug!(channel, command = ?parsed.command, "dispatching command");

        if let Some(reply) = self.route(channel, sender, &parsed).await? {
            self.gateway.reply(channel, &reply, sender).await?;
        }
        Ok(())
    }

    async fn route(
        &self,
        channel: &str,
        sender: &ChatUser,
        parsed: &ParsedCommand,
    ) -> Result<Option<String>> {
        match parsed.command {
            Command::Ask => Ok(Some(simple::ask(
                &parsed.joined_args(),
                AskOptions::default(),
            ))),
            Command::Choice => Ok(Some(simple::choice(&parsed.args))),
            Command::Calc => Ok(Some(simple::calc(&parsed.joined_args()))),
            Command::Gpt => self.gpt(channel, sender, parsed).await,
            Command::Dj => self.dj.handle(channel, &parsed.args, sender).await,
            Command::Config => configure(&self.settings, channel, &parsed.args, sender).await,
        }
    }

    async fn gpt(
        &self,
        channel: &str,
        sender: &ChatUser,
        parsed: &ParsedCommand,
    ) -> Result<Option<String>> {
        // Only a bare lowercase `clear` wipes history; anything longer is a question.
        let clear = matches!(parsed.args.as_slice(), [only] if only == "clear");
        if let (true, Some(username)) = (clear, sender.username.as_deref()) {
            return self
                .queue
                .clear_history(channel, username)
                .await
                .map(|reply| Some(reply.to_owned()));
        }

        self.queue
            .submit(channel, &parsed.joined_args(), sender)
            .await?;
        Ok(None)
    }
}
