//! `!dj`: playlist control through the external DJ service.

use std::sync::Arc;

use reqwest::Url;
use tracing::warn;

use crate::models::user::ChatUser;
use crate::services::{AddTrackOutcome, PlaylistService, VideoSearch};
use crate::settings::ChannelSettings;
use crate::Result;

/// Reply when the channel has no DJ id configured.
pub const NO_DJ_ID: &str = "Для этого канала не указан идентификатор StreamDJ";
/// Reply when nothing is playing.
pub const NOTHING_PLAYING: &str = "Ничего не играет";
/// Reply for an empty playlist.
pub const PLAYLIST_EMPTY: &str = "Список треков пуст :(";
/// Reply when `add` has no query.
pub const ADD_PROMPT: &str = "Не указано название трека или ютуб ссылка";
/// Reply when a search finds nothing.
pub const NOTHING_FOUND: &str = "Ничего не найдено";
/// Reply after a successful add.
pub const TRACK_ADDED: &str = "Трек успешно добавлен";
/// Reply for unrecognized responses and transport failures.
pub const UNKNOWN_FAILURE: &str = "Произошла неизвестная ошибка";
/// Reply for an unknown subcommand.
pub const UNKNOWN_SUBCOMMAND: &str = "Неизвестная команда";

const SEARCH_SUFFIX: &str = "Official Music Video";

/// Translates `!dj` subcommands into playlist service calls.
pub struct DjHandler {
    playlist: Arc<dyn PlaylistService>,
    search: Arc<dyn VideoSearch>,
    settings: ChannelSettings,
    fallback_author: String,
}

impl DjHandler {
    /// Create a handler; `fallback_author` attributes tracks from
    /// anonymous senders.
    #[must_use]
    pub fn new(
        playlist: Arc<dyn PlaylistService>,
        search: Arc<dyn VideoSearch>,
        settings: ChannelSettings,
        fallback_author: String,
    ) -> Self {
        Self {
            playlist,
            search,
            settings,
            fallback_author,
        }
    }

    /// Handle `!dj <subcommand> [args]` in `channel`.
    ///
    /// Service failures are logged and answered with a generic message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if channel settings cannot be read.
    pub async fn handle(
        &self,
        channel: &str,
        args: &[String],
        sender: &ChatUser,
    ) -> Result<Option<String>> {
        let Some(dj_id) = self.settings.stream_dj_id(channel).await? else {
            return Ok(Some(NO_DJ_ID.to_owned()));
        };
        let subcommand = args.first().map(|s| s.to_lowercase()).unwrap_or_default();
        let query = args.get(1..).unwrap_or_default().join(" ");

        let outcome = match subcommand.as_str() {
            "current" => self.current(&dj_id).await,
            "count" => self.count(&dj_id).await,
            "list" => self.list(&dj_id).await,
            "add" => self.add(&dj_id, &query, sender).await,
            "link" => {
                return Ok(self
                    .settings
                    .stream_dj_link(channel)
                    .await?
                    .map(|link| format!("Ссылка на диджея: {link}")));
            }
            _ => return Ok(Some(UNKNOWN_SUBCOMMAND.to_owned())),
        };

        Ok(Some(outcome.unwrap_or_else(|err| {
            warn!(channel, %subcommand, %err, "dj request failed");
            UNKNOWN_FAILURE.to_owned()
        })))
    }

    async fn current(&self, dj_id: &str) -> Result<String> {
        Ok(match self.playlist.current_track(dj_id).await? {
            None => NOTHING_PLAYING.to_owned(),
            Some(track) => format!(
                "Текущий трек: {}, прислал - {}. Ссылка: https://www.youtube.com/watch?v={}",
                track.title, track.author, track.yid
            ),
        })
    }

    async fn count(&self, dj_id: &str) -> Result<String> {
        let entries = self.playlist.playlist(dj_id).await?;
        Ok(format!("Количество треков: {}", entries.len()))
    }

    async fn list(&self, dj_id: &str) -> Result<String> {
        let entries = self.playlist.playlist(dj_id).await?;
        if entries.is_empty() {
            return Ok(PLAYLIST_EMPTY.to_owned());
        }

        let listed: String = entries
            .iter()
            .map(|entry| format!(" {} - {};", entry.index, entry.title))
            .collect();
        Ok(format!("Количество треков: {}.{listed}", entries.len()))
    }

    async fn add(&self, dj_id: &str, query: &str, sender: &ChatUser) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(ADD_PROMPT.to_owned());
        }

        let link = if is_video_link(query) {
            query.to_owned()
        } else {
            let search = format!("{query} {SEARCH_SUFFIX}");
            match self.search.first_video_link(&search).await? {
                Some(link) => link,
                None => return Ok(NOTHING_FOUND.to_owned()),
            }
        };

        let author = [sender.username.as_deref(), Some(self.fallback_author.as_str())]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .unwrap_or("unknown");

        Ok(match self.playlist.add_track(dj_id, &link, author).await? {
            AddTrackOutcome::Added => TRACK_ADDED.to_owned(),
            AddTrackOutcome::Rejected(reason) => format!("Ошибка: {}", reason.to_lowercase()),
            AddTrackOutcome::Unrecognized => UNKNOWN_FAILURE.to_owned(),
        })
    }
}

/// Whether `query` is a single well-formed http(s) link.
#[must_use]
pub fn is_video_link(query: &str) -> bool {
    if query.contains(char::is_whitespace) {
        return false;
    }
    Url::parse(query).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
    })
}
