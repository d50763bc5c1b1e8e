//! Owned chat connection with explicit reconnect.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{ChatGateway, GatewayConnector, GatewayEvent, Identity};
use crate::models::channel::normalize_channel;
use crate::models::user::ChatUser;
use crate::{AppError, Result};

const EVENT_CAPACITY: usize = 256;

struct Live {
    gateway: Arc<dyn ChatGateway>,
    channels: Vec<String>,
    forwarder: JoinHandle<()>,
}

/// Owns the single live connection of a bot identity.
///
/// Events from whichever connection is current are forwarded into one
/// stable receiver handed out by [`ConnectionManager::new`], so consumers
/// are unaffected by reconnects. The manager is itself a [`ChatGateway`]
/// that delegates to the current connection.
pub struct ConnectionManager {
    connector: Arc<dyn GatewayConnector>,
    identity: Identity,
    live: RwLock<Option<Live>>,
    events_tx: mpsc::Sender<GatewayEvent>,
}

impl ConnectionManager {
    /// Create a disconnected manager and the receiver all events flow into.
    #[must_use]
    pub fn new(
        connector: Arc<dyn GatewayConnector>,
        identity: Identity,
    ) -> (Self, mpsc::Receiver<GatewayEvent>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        (
            Self {
                connector,
                identity,
                live: RwLock::new(None),
                events_tx,
            },
            events_rx,
        )
    }

    /// Connect and join `channels`, replacing any existing connection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Gateway` if the connector fails; the previous
    /// connection, if any, stays in place then.
    pub async fn connect(&self, channels: Vec<String>) -> Result<()> {
        let channels: Vec<String> = channels.iter().map(|c| normalize_channel(c)).collect();
        let connection = self.connector.connect(&self.identity, &channels).await?;

        let events_tx = self.events_tx.clone();
        let mut events = connection.events;
        let forwarder = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if events_tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        let previous = self.live.write().await.replace(Live {
            gateway: connection.gateway,
            channels: channels.clone(),
            forwarder,
        });
        if let Some(previous) = previous {
            previous.forwarder.abort();
        }

        info!(user = %self.identity.username, ?channels, "chat connection established");
        Ok(())
    }

    /// Rebuild the connection for a changed channel list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Gateway` if the new connection cannot be opened.
    pub async fn reconnect(&self, channels: Vec<String>) -> Result<()> {
        info!("reconnecting chat gateway with new channel list");
        self.connect(channels).await
    }

    /// Drop the live connection, if any.
    pub async fn disconnect(&self) {
        if let Some(live) = self.live.write().await.take() {
            live.forwarder.abort();
            info!("chat connection closed");
        }
    }

    /// Channels joined by the current connection.
    pub async fn channels(&self) -> Vec<String> {
        self.live
            .read()
            .await
            .as_ref()
            .map(|live| live.channels.clone())
            .unwrap_or_default()
    }

    async fn current(&self) -> Result<Arc<dyn ChatGateway>> {
        self.live
            .read()
            .await
            .as_ref()
            .map(|live| Arc::clone(&live.gateway))
            .ok_or_else(|| {
                warn!("send attempted without a live chat connection");
                AppError::Gateway("not connected".into())
            })
    }
}

impl ChatGateway for ConnectionManager {
    fn send<'a>(
        &'a self,
        channel: &'a str,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move { self.current().await?.send(channel, text).await })
    }

    fn reply<'a>(
        &'a self,
        channel: &'a str,
        text: &'a str,
        to: &'a ChatUser,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move { self.current().await?.reply(channel, text, to).await })
    }
}
