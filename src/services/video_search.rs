//! Video lookup used by `!dj add` for free-text queries.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::VideoSearchConfig;
use crate::{AppError, Result};

/// Resolves a search query to a playable video link.
pub trait VideoSearch: Send + Sync {
    /// Link of the first matching video, or `None` when nothing matches.
    fn first_video_link<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

/// YouTube Data API v3 search client.
pub struct YouTubeSearch {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl YouTubeSearch {
    /// Build a client from configuration; the API key is taken from the
    /// runtime-loaded credential on `config`.
    #[must_use]
    pub fn new(config: &VideoSearchConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        }
    }

    async fn search(&self, query: &str) -> Result<Option<String>> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(AppError::Search("youtube api key is not configured".into()));
        };

        let url = format!("{}/search", self.base_url);
        debug!(%url, query, "searching videos");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", "1"),
                ("q", query),
                ("key", key),
            ])
            .send()
            .await
            .map_err(|err| AppError::Search(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Search(format!("search returned {status}")));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|err| AppError::Search(format!("invalid search response: {err}")))?;

        Ok(body
            .items
            .into_iter()
            .find_map(|item| item.id.video_id)
            .map(|id| format!("https://www.youtube.com/watch?v={id}")))
    }
}

impl VideoSearch for YouTubeSearch {
    fn first_video_link<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>> {
        Box::pin(self.search(query))
    }
}
