//! Unit tests for `GlobalConfig` parsing and validation.

use std::io::Write;
use std::path::Path;

use chat_commander::config::GlobalConfig;
use chat_commander::AppError;

fn sample_toml() -> &'static str {
    r##"
database_path = "data/bot.db"
channels = ["#Streamer", "other"]
retention_days = 14

[bot]
username = "commander"

[queue]
flood_limit = 5
chunk_size = 400

[generation]
base_url = "http://localhost:8080/v1"
model = "gpt-4o-mini"
temperature = 0.7
timeout_seconds = 30

[playlist]
api_base_url = "http://localhost:9000/api"
app_base_url = "http://localhost:9000"

[video_search]
base_url = "http://localhost:9100/youtube/v3"
"##
}

fn minimal_toml() -> &'static str {
    r#"
database_path = "bot.db"

[bot]
username = "commander"
"#
}

#[test]
fn parses_full_config() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.database_path, Path::new("data/bot.db"));
    assert_eq!(config.bot.username, "commander");
    assert!(config.bot.oauth_token.is_empty());
    assert_eq!(config.channels, ["#Streamer", "other"]);
    assert_eq!(config.queue.flood_limit, 5);
    assert_eq!(config.queue.chunk_size, 400);
    assert_eq!(config.generation.model, "gpt-4o-mini");
    assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.generation.timeout_seconds, 30);
    assert_eq!(config.playlist.app_base_url, "http://localhost:9000");
    assert_eq!(config.video_search.base_url, "http://localhost:9100/youtube/v3");
    assert!(config.video_search.api_key.is_none());
    assert_eq!(config.retention_days, 14);
}

#[test]
fn minimal_config_uses_defaults() {
    let config = GlobalConfig::from_toml_str(minimal_toml()).expect("config parses");

    assert!(config.channels.is_empty());
    assert_eq!(config.queue.flood_limit, 3);
    assert_eq!(config.queue.chunk_size, 500);
    assert_eq!(config.generation.base_url, "https://api.openai.com/v1");
    assert_eq!(config.generation.model, "gpt-3.5-turbo");
    assert!((config.generation.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(config.generation.timeout_seconds, 120);
    assert_eq!(config.playlist.api_base_url, "https://streamdj.ru/api");
    assert_eq!(config.playlist.app_base_url, "https://streamdj.app");
    assert_eq!(config.retention_days, 30);
}

#[test]
fn empty_username_is_rejected() {
    let toml = minimal_toml().replace("\"commander\"", "\"  \"");
    let err = GlobalConfig::from_toml_str(&toml).unwrap_err();
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("bot.username")));
}

#[test]
fn zero_limits_are_rejected() {
    let flood = format!("{}\n[queue]\nflood_limit = 0\n", minimal_toml());
    let err = GlobalConfig::from_toml_str(&flood).unwrap_err();
    assert!(err.to_string().contains("flood_limit"));

    let chunk = format!("{}\n[queue]\nchunk_size = 0\n", minimal_toml());
    let err = GlobalConfig::from_toml_str(&chunk).unwrap_err();
    assert!(err.to_string().contains("chunk_size"));
}

#[test]
fn secrets_in_toml_are_ignored() {
    let toml = minimal_toml().replace(
        "username = \"commander\"",
        "username = \"commander\"\noauth_token = \"oauth:leaked\"",
    );
    let config = GlobalConfig::from_toml_str(&toml).expect("config parses");
    assert!(config.bot.oauth_token.is_empty());
}

#[test]
fn invalid_toml_is_a_config_error() {
    let err = GlobalConfig::from_toml_str("database_path = ").unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn load_from_path_reads_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(sample_toml().as_bytes()).expect("write");

    let config = GlobalConfig::load_from_path(file.path()).expect("load");
    assert_eq!(config.bot.username, "commander");

    let err = GlobalConfig::load_from_path("/nonexistent/config.toml").unwrap_err();
    assert!(err.to_string().starts_with("config:"));
}
