//! Line-oriented console gateway for local operation.
//!
//! Input lines have the form `<channel> <username> <text...>`; the sender
//! gets the `broadcaster` badge when `username` equals the channel name.
//! Output is written as `[#channel] @user: text`. On connect the bot
//! "joins" every channel, emitting self-join events.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use super::{ChatGateway, Connection, GatewayConnector, GatewayEvent, Identity};
use crate::models::channel::normalize_channel;
use crate::models::user::{ChatUser, BROADCASTER_BADGE};
use crate::Result;

const LINE_CAPACITY: usize = 64;

/// Connector that reads chat lines from stdin and writes replies to stdout.
pub struct ConsoleConnector {
    lines: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl ConsoleConnector {
    /// Start the shared stdin reader.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(LINE_CAPACITY);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            info!("console input closed");
        });
        Self::from_lines(rx)
    }

    /// Build a connector over an arbitrary line source.
    #[must_use]
    pub fn from_lines(lines: mpsc::Receiver<String>) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
        }
    }
}

/// Parse one console line into a message event.
#[must_use]
pub fn parse_line(line: &str, bot_username: &str) -> Option<GatewayEvent> {
    let mut parts = line.trim().splitn(3, char::is_whitespace);
    let channel = normalize_channel(parts.next()?);
    let username = parts.next()?.to_lowercase();
    let text = parts.next().unwrap_or_default().trim_start().to_owned();
    if channel.is_empty() || username.is_empty() {
        return None;
    }

    let mut sender = ChatUser::named(username.clone());
    if username == channel {
        sender.badges.push(BROADCASTER_BADGE.to_owned());
    }

    Some(GatewayEvent::Message {
        channel,
        is_self: username.eq_ignore_ascii_case(bot_username),
        sender,
        text,
    })
}

impl GatewayConnector for ConsoleConnector {
    fn connect<'a>(
        &'a self,
        identity: &'a Identity,
        channels: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Connection>> + Send + 'a>> {
        Box::pin(async move {
            let (tx, events) = mpsc::channel(LINE_CAPACITY);

            let lines = Arc::clone(&self.lines);
            let joined = channels.to_vec();
            let bot = identity.username.clone();
            tokio::spawn(async move {
                // Joins are emitted here, after the receiver has been handed
                // out, so any number of channels fits the bounded stream.
                for channel in &joined {
                    let join = GatewayEvent::Join {
                        channel: channel.clone(),
                        username: bot.clone(),
                        is_self: true,
                    };
                    if tx.send(join).await.is_err() {
                        debug!("console connection dropped before joins were delivered");
                        return;
                    }
                }

                let mut lines = lines.lock().await;
                loop {
                    // A replaced connection must release the reader before
                    // consuming another line.
                    let line = tokio::select! {
                        biased;
                        () = tx.closed() => break,
                        line = lines.recv() => match line {
                            Some(line) => line,
                            None => break,
                        },
                    };
                    let Some(event) = parse_line(&line, &bot) else {
                        debug!(%line, "ignoring malformed console line");
                        continue;
                    };
                    if let GatewayEvent::Message { channel, .. } = &event {
                        if !joined.contains(channel) {
                            debug!(%channel, "ignoring line for channel not joined");
                            continue;
                        }
                    }
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            });

            Ok(Connection {
                gateway: Arc::new(ConsoleGateway),
                events,
            })
        })
    }
}

/// Gateway handle that prints outgoing messages to stdout.
pub struct ConsoleGateway;

impl ConsoleGateway {
    async fn write(line: String) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(())
    }
}

impl ChatGateway for ConsoleGateway {
    fn send<'a>(
        &'a self,
        channel: &'a str,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(Self::write(format!("[#{channel}] {text}")))
    }

    fn reply<'a>(
        &'a self,
        channel: &'a str,
        text: &'a str,
        to: &'a ChatUser,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        let line = match to.mention_name() {
            Some(name) => format!("[#{channel}] @{name}: {text}"),
            None => format!("[#{channel}] {text}"),
        };
        Box::pin(Self::write(line))
    }
}
