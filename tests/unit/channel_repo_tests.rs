//! Unit tests for the joined channel registry.

use std::sync::Arc;

use chat_commander::models::channel::Channel;
use chat_commander::persistence::{channel_repo::ChannelRepo, db};

async fn repo() -> ChannelRepo {
    let db = db::connect_memory().await.expect("db");
    ChannelRepo::new(Arc::new(db))
}

fn names(channels: &[Channel]) -> Vec<&str> {
    channels.iter().map(|c| c.name.as_str()).collect()
}

#[tokio::test]
async fn insert_if_absent_normalizes_and_skips_duplicates() {
    let repo = repo().await;

    assert!(repo.insert_if_absent(&Channel::new("#Streamer")).await.expect("insert"));
    assert!(!repo.insert_if_absent(&Channel::new("streamer")).await.expect("again"));

    let enabled = repo.list_enabled().await.expect("list");
    assert_eq!(names(&enabled), ["streamer"]);
}

#[tokio::test]
async fn disabled_channels_are_not_listed() {
    let repo = repo().await;
    repo.insert_if_absent(&Channel::new("a")).await.expect("insert");
    repo.insert_if_absent(&Channel::new("b")).await.expect("insert");

    assert!(repo.set_enabled("a", false).await.expect("disable"));
    assert!(!repo.set_enabled("missing", false).await.expect("disable missing"));

    assert_eq!(names(&repo.list_enabled().await.expect("list")), ["b"]);
}

#[tokio::test]
async fn list_change_adds_and_disables_only_named_channels() {
    let repo = repo().await;
    repo.insert_if_absent(&Channel::new("a")).await.expect("insert");
    repo.insert_if_absent(&Channel::new("b")).await.expect("insert");
    repo.insert_if_absent(&Channel::new("manual")).await.expect("insert");

    let previous = vec!["a".to_owned(), "b".to_owned()];
    let next = vec!["b".to_owned(), "c".to_owned()];
    let enabled = repo
        .apply_list_change(&previous, &next)
        .await
        .expect("apply");

    assert_eq!(enabled, ["b", "c", "manual"]);
}

#[tokio::test]
async fn list_change_reenables_returning_channels() {
    let repo = repo().await;
    let a = vec!["a".to_owned()];
    let empty: Vec<String> = Vec::new();

    repo.apply_list_change(&empty, &a).await.expect("add");
    assert!(repo.apply_list_change(&a, &empty).await.expect("drop").is_empty());
    assert_eq!(repo.apply_list_change(&empty, &a).await.expect("readd"), ["a"]);
}
