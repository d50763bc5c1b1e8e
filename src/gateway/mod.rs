//! Chat gateway abstraction.
//!
//! The [`ChatGateway`] trait decouples command handling and the task queue
//! from the chat network protocol. A [`GatewayConnector`] opens one live
//! connection per bot identity; [`ConnectionManager`] owns that connection
//! and rebuilds it when the joined channel list changes.

pub mod console;
pub mod manager;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::models::user::ChatUser;
use crate::Result;

pub use manager::ConnectionManager;

/// Events delivered by a gateway connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// A chat line posted in a joined channel.
    Message {
        /// Channel the line was posted in.
        channel: String,
        /// Sender metadata.
        sender: ChatUser,
        /// Raw message text.
        text: String,
        /// Whether the bot itself sent the line.
        is_self: bool,
    },
    /// A user (possibly the bot) joined a channel.
    Join {
        /// Channel that was joined.
        channel: String,
        /// Login of the joining user.
        username: String,
        /// Whether the bot itself joined.
        is_self: bool,
    },
}

/// Outgoing side of a live chat connection.
pub trait ChatGateway: Send + Sync {
    /// Post `text` to `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Gateway`](crate::AppError::Gateway) if delivery fails.
    fn send<'a>(
        &'a self,
        channel: &'a str,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Post `text` to `channel` as a reply mentioning `to`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Gateway`](crate::AppError::Gateway) if delivery fails.
    fn reply<'a>(
        &'a self,
        channel: &'a str,
        text: &'a str,
        to: &'a ChatUser,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Credentials the bot connects with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Bot login.
    pub username: String,
    /// OAuth token for the chat network.
    pub oauth_token: String,
}

/// A freshly opened connection: outgoing handle plus incoming events.
pub struct Connection {
    /// Handle used to send messages.
    pub gateway: Arc<dyn ChatGateway>,
    /// Events emitted by the network for the joined channels.
    pub events: mpsc::Receiver<GatewayEvent>,
}

/// Factory for live chat connections.
pub trait GatewayConnector: Send + Sync {
    /// Connect as `identity` and join `channels`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Gateway`](crate::AppError::Gateway) if the
    /// connection cannot be established.
    fn connect<'a>(
        &'a self,
        identity: &'a Identity,
        channels: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Connection>> + Send + 'a>>;
}
