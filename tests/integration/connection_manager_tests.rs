//! Connection lifecycle through the console connector.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use chat_commander::gateway::console::ConsoleConnector;
use chat_commander::gateway::{ChatGateway, ConnectionManager, GatewayEvent, Identity};
use chat_commander::models::user::ChatUser;
use chat_commander::AppError;

use super::test_helpers::BOT;

fn manager() -> (
    ConnectionManager,
    mpsc::Receiver<GatewayEvent>,
    mpsc::Sender<String>,
) {
    let (lines_tx, lines_rx) = mpsc::channel(16);
    let connector = Arc::new(ConsoleConnector::from_lines(lines_rx));
    let identity = Identity {
        username: BOT.to_owned(),
        oauth_token: "oauth:test".to_owned(),
    };
    let (manager, events) = ConnectionManager::new(connector, identity);
    (manager, events, lines_tx)
}

async fn next_event(events: &mut mpsc::Receiver<GatewayEvent>) -> GatewayEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("event in time")
        .expect("stream open")
}

fn self_join(channel: &str) -> GatewayEvent {
    GatewayEvent::Join {
        channel: channel.to_owned(),
        username: BOT.to_owned(),
        is_self: true,
    }
}

#[tokio::test]
async fn connect_joins_normalized_channels() {
    let (manager, mut events, _lines) = manager();

    manager
        .connect(vec!["#Alpha".into(), "beta".into()])
        .await
        .expect("connect");

    assert_eq!(manager.channels().await, ["alpha", "beta"]);
    assert_eq!(next_event(&mut events).await, self_join("alpha"));
    assert_eq!(next_event(&mut events).await, self_join("beta"));
}

#[tokio::test]
async fn connect_with_more_channels_than_the_stream_buffers() {
    let (manager, mut events, _lines) = manager();
    let channels: Vec<String> = (0..100).map(|n| format!("chan{n}")).collect();

    tokio::time::timeout(Duration::from_secs(3), manager.connect(channels.clone()))
        .await
        .expect("connect returns without waiting on a consumer")
        .expect("connect");

    for channel in &channels {
        assert_eq!(next_event(&mut events).await, self_join(channel));
    }
}

#[tokio::test]
async fn lines_for_joined_channels_become_messages() {
    let (manager, mut events, lines) = manager();
    manager.connect(vec!["alpha".into()]).await.expect("connect");
    next_event(&mut events).await;

    lines.send("gamma viewer !ask ignored".into()).await.expect("send");
    lines.send("alpha viewer !ask is it?".into()).await.expect("send");

    let GatewayEvent::Message {
        channel,
        sender,
        text,
        is_self,
    } = next_event(&mut events).await
    else {
        panic!("expected message");
    };
    assert_eq!(channel, "alpha");
    assert_eq!(sender.username.as_deref(), Some("viewer"));
    assert_eq!(text, "!ask is it?");
    assert!(!is_self);
}

#[tokio::test]
async fn reconnect_switches_channels_on_the_same_stream() {
    let (manager, mut events, lines) = manager();
    manager.connect(vec!["alpha".into()]).await.expect("connect");
    assert_eq!(next_event(&mut events).await, self_join("alpha"));

    manager
        .reconnect(vec!["beta".into()])
        .await
        .expect("reconnect");
    assert_eq!(manager.channels().await, ["beta"]);
    assert_eq!(next_event(&mut events).await, self_join("beta"));
    // Let the replaced reader observe its closed stream.
    tokio::time::sleep(Duration::from_millis(20)).await;

    lines.send("alpha viewer old channel".into()).await.expect("send");
    lines.send("beta viewer new channel".into()).await.expect("send");
    let GatewayEvent::Message { channel, text, .. } = next_event(&mut events).await else {
        panic!("expected message");
    };
    assert_eq!(channel, "beta");
    assert_eq!(text, "new channel");
}

#[tokio::test]
async fn sending_requires_a_live_connection() {
    let (manager, _events, _lines) = manager();
    let to = ChatUser::named("viewer");

    let err = manager.send("alpha", "hello").await.unwrap_err();
    assert!(matches!(err, AppError::Gateway(_)));

    manager.connect(vec!["alpha".into()]).await.expect("connect");
    manager.reply("alpha", "hello", &to).await.expect("reply");

    manager.disconnect().await;
    assert!(manager.channels().await.is_empty());
    let err = manager.reply("alpha", "hello", &to).await.unwrap_err();
    assert!(matches!(err, AppError::Gateway(_)));
}
