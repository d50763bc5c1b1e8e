//! Unit tests for per-user conversation history.

use std::sync::Arc;

use chat_commander::models::history::{ChatRole, HistoryMessage};
use chat_commander::persistence::{db, history_repo::HistoryRepo};

fn turn(channel: &str, user: &str, role: ChatRole, content: &str) -> HistoryMessage {
    HistoryMessage::new(channel.to_owned(), user.to_owned(), role, content.to_owned())
}

#[tokio::test]
async fn append_preserves_order_and_scope() {
    let db = db::connect_memory().await.expect("db");
    let repo = HistoryRepo::new(Arc::new(db));

    repo.append(&[
        turn("chan", "a", ChatRole::User, "q1"),
        turn("chan", "a", ChatRole::Assistant, "a1"),
    ])
    .await
    .expect("append");
    repo.append(&[turn("chan", "b", ChatRole::User, "other user")])
        .await
        .expect("append b");
    repo.append(&[turn("elsewhere", "a", ChatRole::User, "other channel")])
        .await
        .expect("append elsewhere");

    let history = repo.list("chan", "a").await.expect("list");
    let contents: Vec<(ChatRole, &str)> = history
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(
        contents,
        [(ChatRole::User, "q1"), (ChatRole::Assistant, "a1")]
    );
}

#[tokio::test]
async fn clear_removes_only_that_conversation() {
    let db = db::connect_memory().await.expect("db");
    let repo = HistoryRepo::new(Arc::new(db));

    repo.append(&[
        turn("chan", "a", ChatRole::User, "q"),
        turn("chan", "a", ChatRole::Assistant, "a"),
        turn("chan", "b", ChatRole::User, "keep"),
    ])
    .await
    .expect("append");

    assert_eq!(repo.clear("chan", "a").await.expect("clear"), 2);
    assert_eq!(repo.clear("chan", "a").await.expect("clear again"), 0);
    assert!(repo.list("chan", "a").await.expect("list").is_empty());
    assert_eq!(repo.list("chan", "b").await.expect("list b").len(), 1);
}
