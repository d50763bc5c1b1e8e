//! The gateway event loop keeps serving chat while a generation is held.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use chat_commander::gateway::GatewayEvent;
use chat_commander::models::setting::SettingKind;
use chat_commander::models::user::ChatUser;

use super::test_helpers::{message, FakeGenerator, Harness, API_KEY, CHANNEL};

const OTHER: &str = "otherchan";

fn message_in(channel: &str, user: &str, text: &str) -> GatewayEvent {
    GatewayEvent::Message {
        channel: channel.to_owned(),
        sender: ChatUser::named(user),
        text: text.to_owned(),
        is_self: false,
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition reached in time");
}

#[tokio::test]
async fn held_generation_does_not_block_other_events() {
    let h = Harness::new(FakeGenerator::gated()).await.with_api_key().await;
    h.settings
        .set(OTHER, SettingKind::OpenAiApiKey, API_KEY)
        .await
        .expect("set key");

    let (events, rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let event_loop = Arc::clone(&h.dispatcher).spawn_event_loop(rx, cancel.clone());

    events
        .send(message("viewer", "!gpt slow question"))
        .await
        .expect("send");
    h.generator.wait_started().await;

    // Same channel, different command.
    events
        .send(message("asker", "!ask is it?"))
        .await
        .expect("send");
    wait_for(|| !h.gateway.replies_to("asker").is_empty()).await;

    // Another channel's queue runs independently.
    events
        .send(message_in(OTHER, "neighbour", "!gpt also slow"))
        .await
        .expect("send");
    wait_for(|| h.generator.calls().len() == 2).await;

    assert_eq!(h.tasks.count_in_progress(CHANNEL).await.expect("count"), 1);
    assert_eq!(h.tasks.count_in_progress(OTHER).await.expect("count"), 1);
    assert_eq!(h.generator.max_in_flight(), 2);

    h.generator.release(2);
    wait_for(|| h.gateway.replies_to("neighbour").len() == 2).await;
    wait_for(|| h.gateway.replies_to("viewer").len() == 2).await;

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), event_loop)
        .await
        .expect("stopped in time")
        .expect("join");
}

#[tokio::test]
async fn closed_stream_ends_the_loop() {
    let h = Harness::new(FakeGenerator::echo()).await;
    let (events, rx) = mpsc::channel(1);
    let event_loop = Arc::clone(&h.dispatcher).spawn_event_loop(rx, CancellationToken::new());

    drop(events);

    tokio::time::timeout(Duration::from_secs(2), event_loop)
        .await
        .expect("stopped in time")
        .expect("join");
}
