//! External playlist ("DJ") service client.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::PlaylistConfig;
use crate::{AppError, Result};

/// The track currently playing on a DJ channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Track {
    /// Track title.
    pub title: String,
    /// Name of the viewer who requested the track.
    pub author: String,
    /// YouTube video id.
    pub yid: String,
}

/// One queued playlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    /// Position label as reported by the service.
    pub index: String,
    /// Track title.
    pub title: String,
}

/// Result of an add-track request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddTrackOutcome {
    /// The service accepted the track.
    Added,
    /// The service rejected the track with a reason.
    Rejected(String),
    /// The response had neither a success nor an error marker.
    Unrecognized,
}

/// Playlist operations keyed by the service's numeric channel id.
pub trait PlaylistService: Send + Sync {
    /// Now-playing track, if any.
    fn current_track<'a>(
        &'a self,
        dj_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Track>>> + Send + 'a>>;

    /// Queued tracks in service order.
    fn playlist<'a>(
        &'a self,
        dj_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PlaylistEntry>>> + Send + 'a>>;

    /// Request a track by video link on behalf of `author`.
    fn add_track<'a>(
        &'a self,
        dj_id: &'a str,
        url: &'a str,
        author: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<AddTrackOutcome>> + Send + 'a>>;
}

/// HTTP client for StreamDJ.
pub struct StreamDjClient {
    client: Client,
    api_base_url: String,
    app_base_url: String,
}

impl StreamDjClient {
    /// Build a client from configuration.
    #[must_use]
    pub fn new(config: &PlaylistConfig) -> Self {
        Self {
            client: Client::new(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            app_base_url: config.app_base_url.trim_end_matches('/').to_owned(),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        debug!(%url, "playlist request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| AppError::Playlist(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Playlist(format!("{url} returned {status}")));
        }
        response
            .json::<Value>()
            .await
            .map_err(|err| AppError::Playlist(format!("invalid response from {url}: {err}")))
    }

    async fn fetch_current(&self, dj_id: &str) -> Result<Option<Track>> {
        let url = format!("{}/get_track/{dj_id}", self.api_base_url);
        match self.get_json(&url).await? {
            Value::Null | Value::Bool(false) => Ok(None),
            value => serde_json::from_value(value)
                .map(Some)
                .map_err(|err| AppError::Playlist(format!("unexpected track shape: {err}"))),
        }
    }

    async fn fetch_playlist(&self, dj_id: &str) -> Result<Vec<PlaylistEntry>> {
        let url = format!("{}/playlist/{dj_id}/c", self.api_base_url);
        Ok(parse_playlist(&self.get_json(&url).await?))
    }

    async fn post_track(&self, dj_id: &str, url: &str, author: &str) -> Result<AddTrackOutcome> {
        let endpoint = format!("{}/includes/back.php", self.app_base_url);
        debug!(%endpoint, dj_id, "submitting track");
        let response = self
            .client
            .post(&endpoint)
            .query(&[("func", "add_track"), ("channel", dj_id)])
            .form(&[("url", url), ("author", author)])
            .send()
            .await
            .map_err(|err| AppError::Playlist(err.to_string()))?;
        let body: Value = response
            .json()
            .await
            .map_err(|err| AppError::Playlist(format!("invalid add_track response: {err}")))?;
        Ok(parse_add_outcome(&body))
    }
}

/// Interpret a playlist payload.
///
/// The service answers `false` for an empty list, otherwise an object keyed
/// by position (sometimes an array). Numeric keys are ordered numerically.
#[must_use]
pub fn parse_playlist(value: &Value) -> Vec<PlaylistEntry> {
    let title_of = |entry: &Value| {
        entry
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };

    match value {
        Value::Object(map) => {
            let mut entries: Vec<PlaylistEntry> = map
                .iter()
                .map(|(index, entry)| PlaylistEntry {
                    index: index.clone(),
                    title: title_of(entry),
                })
                .collect();
            entries.sort_by(|a, b| {
                match (a.index.parse::<u64>(), b.index.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => a.index.cmp(&b.index),
                }
            });
            entries
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, entry)| PlaylistEntry {
                index: index.to_string(),
                title: title_of(entry),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Interpret an add-track response body.
#[must_use]
pub fn parse_add_outcome(value: &Value) -> AddTrackOutcome {
    let truthy = |v: &Value| match v {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    };

    if value.get("success").is_some_and(truthy) {
        return AddTrackOutcome::Added;
    }
    match value.get("error") {
        Some(Value::String(reason)) if !reason.is_empty() => {
            AddTrackOutcome::Rejected(reason.clone())
        }
        Some(other) if truthy(other) => AddTrackOutcome::Rejected(other.to_string()),
        _ => AddTrackOutcome::Unrecognized,
    }
}

impl PlaylistService for StreamDjClient {
    fn current_track<'a>(
        &'a self,
        dj_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Track>>> + Send + 'a>> {
        Box::pin(self.fetch_current(dj_id))
    }

    fn playlist<'a>(
        &'a self,
        dj_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PlaylistEntry>>> + Send + 'a>> {
        Box::pin(self.fetch_playlist(dj_id))
    }

    fn add_track<'a>(
        &'a self,
        dj_id: &'a str,
        url: &'a str,
        author: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<AddTrackOutcome>> + Send + 'a>> {
        Box::pin(self.post_track(dj_id, url, author))
    }
}
