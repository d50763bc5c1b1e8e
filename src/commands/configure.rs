//! `!config`: broadcaster-only per-channel settings.

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::models::setting::SettingKind;
use crate::models::user::ChatUser;
use crate::settings::ChannelSettings;
use crate::Result;

static API_KEY_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^sk-[A-Za-z0-9_-]{20,}$").ok());
static DJ_ID_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\d+$").ok());
static DJ_LINK_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^https://streamdj\.app/c/\w+$").ok());

fn matches(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

/// Outcome messages for one setting kind.
struct Rule {
    pattern: &'static LazyLock<Option<Regex>>,
    invalid: &'static str,
    stored: &'static str,
}

fn rule(kind: SettingKind) -> Rule {
    match kind {
        SettingKind::OpenAiApiKey => Rule {
            pattern: &API_KEY_PATTERN,
            invalid: "Неверный формат ключа",
            stored: "Ключ успешно установлен",
        },
        SettingKind::StreamDjId => Rule {
            pattern: &DJ_ID_PATTERN,
            invalid: "Неверный формат идентификатора StreamDJ",
            stored: "Идентификатор StreamDJ успешно установлен",
        },
        SettingKind::StreamDjLink => Rule {
            pattern: &DJ_LINK_PATTERN,
            invalid: "Неверный формат ссылки на StreamDJ",
            stored: "Ссылка на StreamDJ успешно установлена",
        },
    }
}

/// Reply listing the accepted kinds.
#[must_use]
pub fn available_options() -> String {
    let kinds: Vec<&str> = SettingKind::ALL.iter().map(|kind| kind.as_str()).collect();
    format!("Доступные конфигурационные опции: {}", kinds.join(", "))
}

/// Handle `!config <KIND> <value>`.
///
/// Returns `None` for senders without the broadcaster badge.
///
/// # Errors
///
/// Returns `AppError::Db` if the setting cannot be stored.
pub async fn configure(
    settings: &ChannelSettings,
    channel: &str,
    args: &[String],
    sender: &ChatUser,
) -> Result<Option<String>> {
    if !sender.is_broadcaster() {
        return Ok(None);
    }

    let Some(kind) = args.first().and_then(|raw| raw.parse::<SettingKind>().ok()) else {
        return Ok(Some(available_options()));
    };
    let value = args.get(1).map_or("", String::as_str);

    let rule = rule(kind);
    if !matches(rule.pattern, value) {
        return Ok(Some(rule.invalid.to_owned()));
    }

    settings.set(channel, kind, value).await?;
    info!(channel, %kind, "channel setting updated");
    Ok(Some(rule.stored.to_owned()))
}
