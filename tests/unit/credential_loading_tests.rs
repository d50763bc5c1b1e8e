//! Unit tests for runtime credential loading.
//!
//! These tests mutate process-global env vars and run serially. The test
//! environment has no keychain entries for the `chat-commander` service,
//! so lookups fall back to env vars.

use chat_commander::config::GlobalConfig;

fn make_config() -> GlobalConfig {
    GlobalConfig::from_toml_str(
        r#"
database_path = "bot.db"

[bot]
username = "commander"
"#,
    )
    .expect("config parses")
}

#[tokio::test]
#[serial_test::serial]
async fn env_var_credentials_are_loaded() {
    let mut config = make_config();
    std::env::set_var("BOT_OAUTH_TOKEN", "oauth:test-token");
    std::env::set_var("YOUTUBE_API_KEY", "yt-test-key");

    config.load_credentials().await.expect("credentials load");

    assert_eq!(config.bot.oauth_token, "oauth:test-token");
    assert_eq!(config.video_search.api_key.as_deref(), Some("yt-test-key"));

    std::env::remove_var("BOT_OAUTH_TOKEN");
    std::env::remove_var("YOUTUBE_API_KEY");
}

#[tokio::test]
#[serial_test::serial]
async fn missing_oauth_token_names_env_var() {
    let mut config = make_config();
    std::env::remove_var("BOT_OAUTH_TOKEN");

    let err = config.load_credentials().await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("config:"), "got: {msg}");
    assert!(msg.contains("BOT_OAUTH_TOKEN"), "got: {msg}");
}

#[tokio::test]
#[serial_test::serial]
async fn youtube_key_is_optional() {
    let mut config = make_config();
    std::env::set_var("BOT_OAUTH_TOKEN", "oauth:test-token");
    std::env::remove_var("YOUTUBE_API_KEY");

    config.load_credentials().await.expect("credentials load");
    assert!(config.video_search.api_key.is_none());

    std::env::remove_var("BOT_OAUTH_TOKEN");
}

#[tokio::test]
#[serial_test::serial]
async fn empty_env_var_counts_as_missing() {
    let mut config = make_config();
    std::env::set_var("BOT_OAUTH_TOKEN", "");

    assert!(config.load_credentials().await.is_err());

    std::env::remove_var("BOT_OAUTH_TOKEN");
}
