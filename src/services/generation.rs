//! Answer-generation capability over an OpenAI-compatible API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GenerationConfig;
use crate::models::history::HistoryMessage;
use crate::{AppError, Result};

/// Produces an answer for a prompt, optionally continuing a conversation.
pub trait Generator: Send + Sync {
    /// Generate an answer to `prompt` using `credential`.
    ///
    /// `history` holds earlier turns of the same user in the same channel,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Generation`](crate::AppError::Generation) with a
    /// human-readable provider message on failure.
    fn generate<'a>(
        &'a self,
        credential: &'a str,
        prompt: &'a str,
        history: &'a [HistoryMessage],
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Chat-completions client for OpenAI and compatible providers.
pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    async fn complete(
        &self,
        credential: &str,
        prompt: &str,
        history: &[HistoryMessage],
    ) -> Result<String> {
        let messages = history
            .iter()
            .map(|turn| ChatMessage {
                role: turn.role.as_str(),
                content: &turn.content,
            })
            .chain(std::iter::once(ChatMessage {
                role: "user",
                content: prompt,
            }))
            .collect();
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, turns = history.len(), "requesting chat completion");
        let response = self
            .client
            .post(&url)
            .bearer_auth(credential)
            .json(&request)
            .send()
            .await
            .map_err(|err| AppError::Generation(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AppError::Generation(err.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("status {}", status.as_u16()));
            return Err(AppError::Generation(message));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|err| AppError::Generation(format!("unexpected response: {err}")))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default())
    }
}

impl Generator for OpenAiGenerator {
    fn generate<'a>(
        &'a self,
        credential: &'a str,
        prompt: &'a str,
        history: &'a [HistoryMessage],
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.complete(credential, prompt, history))
    }
}
