//! HTTP clients for generation, playlist and video search against a mock
//! server.

use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chat_commander::config::{GenerationConfig, PlaylistConfig, VideoSearchConfig};
use chat_commander::models::history::{ChatRole, HistoryMessage};
use chat_commander::services::{
    AddTrackOutcome, Generator, OpenAiGenerator, PlaylistService, StreamDjClient, Track,
    VideoSearch, YouTubeSearch,
};
use chat_commander::AppError;

const KEY: &str = "sk-testkeytestkeytestkey0000";

fn generator(server: &MockServer) -> OpenAiGenerator {
    OpenAiGenerator::new(&GenerationConfig {
        base_url: format!("{}/v1/", server.uri()),
        model: "gpt-test".into(),
        temperature: 0.5,
        timeout_seconds: 5,
    })
    .expect("client")
}

fn playlist(server: &MockServer) -> StreamDjClient {
    StreamDjClient::new(&PlaylistConfig {
        api_base_url: format!("{}/api", server.uri()),
        app_base_url: server.uri(),
    })
}

// ── Generation ───────────────────────────────────────────

#[tokio::test]
async fn generation_sends_history_and_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", format!("Bearer {KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Rust is a language." } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let history = [
        HistoryMessage::new("chan".into(), "viewer".into(), ChatRole::User, "hi".into()),
        HistoryMessage::new(
            "chan".into(),
            "viewer".into(),
            ChatRole::Assistant,
            "hello".into(),
        ),
    ];
    let answer = generator(&server)
        .generate(KEY, "what is rust?", &history)
        .await
        .expect("answer");
    assert_eq!(answer, "Rust is a language.");

    let requests = server.received_requests().await.expect("recorded");
    let body: Value = requests[0].body_json().expect("json body");
    assert_eq!(body["model"], "gpt-test");
    assert_eq!(
        body["messages"],
        json!([
            { "role": "user", "content": "hi" },
            { "role": "assistant", "content": "hello" },
            { "role": "user", "content": "what is rust?" },
        ])
    );
}

#[tokio::test]
async fn generation_surfaces_provider_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(KEY, "hi", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Generation(ref m) if m == "Incorrect API key provided"));
}

#[tokio::test]
async fn generation_without_error_body_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(KEY, "hi", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Generation(ref m) if m == "status 502"));
}

#[tokio::test]
async fn generation_with_no_choices_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let answer = generator(&server)
        .generate(KEY, "hi", &[])
        .await
        .expect("answer");
    assert!(answer.is_empty());
}

// ── Playlist ─────────────────────────────────────────────

#[tokio::test]
async fn current_track_handles_null_and_track() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get_track/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/get_track/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Numb",
            "author": "alice",
            "yid": "kXYiU_JCYtU",
            "duration": 187
        })))
        .mount(&server)
        .await;

    let client = playlist(&server);
    assert!(client.current_track("1").await.expect("null").is_none());
    assert_eq!(
        client.current_track("2").await.expect("track"),
        Some(Track {
            title: "Numb".into(),
            author: "alice".into(),
            yid: "kXYiU_JCYtU".into(),
        })
    );
}

#[tokio::test]
async fn playlist_parses_false_and_keyed_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/playlist/1/c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/playlist/2/c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "10": { "title": "c" },
            "2": { "title": "b" },
            "1": { "title": "a" }
        })))
        .mount(&server)
        .await;

    let client = playlist(&server);
    assert!(client.playlist("1").await.expect("empty").is_empty());

    let entries = client.playlist("2").await.expect("entries");
    let labels: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e.index.as_str(), e.title.as_str()))
        .collect();
    assert_eq!(labels, [("1", "a"), ("2", "b"), ("10", "c")]);
}

#[tokio::test]
async fn playlist_http_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = playlist(&server).playlist("1").await.unwrap_err();
    assert!(matches!(err, AppError::Playlist(_)));
}

#[tokio::test]
async fn add_track_posts_form_and_reads_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/includes/back.php"))
        .and(query_param("func", "add_track"))
        .and(query_param("channel", "99840"))
        .and(body_string_contains("author=viewer"))
        .and(body_string_contains("url=https%3A%2F%2Fyoutu.be%2Fabc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/includes/back.php"))
        .and(query_param("channel", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "Трек Уже Добавлен" })),
        )
        .mount(&server)
        .await;

    let client = playlist(&server);
    assert_eq!(
        client
            .add_track("99840", "https://youtu.be/abc", "viewer")
            .await
            .expect("added"),
        AddTrackOutcome::Added
    );
    assert_eq!(
        client
            .add_track("1", "https://youtu.be/abc", "viewer")
            .await
            .expect("rejected"),
        AddTrackOutcome::Rejected("Трек Уже Добавлен".into())
    );
}

// ── Video search ─────────────────────────────────────────

#[tokio::test]
async fn search_returns_watch_link_for_first_video() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .and(query_param("q", "numb Official Music Video"))
        .and(query_param("key", "yt-key"))
        .and(query_param("type", "video"))
        .and(query_param("maxResults", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": { "kind": "youtube#video", "videoId": "kXYiU_JCYtU" } }
            ]
        })))
        .mount(&server)
        .await;

    let search = YouTubeSearch::new(&VideoSearchConfig {
        base_url: format!("{}/youtube/v3", server.uri()),
        api_key: Some("yt-key".into()),
    });
    assert_eq!(
        search
            .first_video_link("numb Official Music Video")
            .await
            .expect("search")
            .as_deref(),
        Some("https://www.youtube.com/watch?v=kXYiU_JCYtU")
    );
}

#[tokio::test]
async fn search_without_results_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let search = YouTubeSearch::new(&VideoSearchConfig {
        base_url: server.uri(),
        api_key: Some("yt-key".into()),
    });
    assert!(search
        .first_video_link("nothing")
        .await
        .expect("search")
        .is_none());
}

#[tokio::test]
async fn search_without_api_key_fails_before_any_request() {
    let server = MockServer::start().await;

    let search = YouTubeSearch::new(&VideoSearchConfig {
        base_url: server.uri(),
        api_key: None,
    });
    let err = search.first_video_link("numb").await.unwrap_err();

    assert!(matches!(err, AppError::Search(_)));
    assert!(server
        .received_requests()
        .await
        .expect("recorded")
        .is_empty());
}
