//! Generative-model client seam.
//!
//! The pipeline talks to its model through the [`ModelClient`] trait and
//! owns all parsing and validation of the free text that comes back —
//! the client's only job is transport. [`OpenAiCompatClient`] implements
//! the trait against any OpenAI-style `/v1/chat/completions` endpoint
//! (OpenAI, OpenRouter, vLLM, llama.cpp server, …) with a per-request
//! hard timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Result, RxError};

/// Default base URL for the OpenAI-compatible client.
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// A single completion request.
///
/// `timeout` is a hard ceiling on the whole HTTP exchange; on expiry the
/// call fails with [`RxError::Timeout`] and the caller degrades per its
/// tier's failure path.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: Option<String>,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

/// Transport-only interface to a generative model.
///
/// Implementations return the raw response text; they never parse it.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Client for OpenAI-style chat-completions endpoints.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    api_key: String,
    model: String,
    http: Client,
    base_url: String,
}

impl OpenAiCompatClient {
    /// Create a client against the default OpenAI endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock,
    /// or any OpenAI-compatible server).
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let http = Client::builder()
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.into(),
            model: model.into(),
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiCompatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.user_prompt,
        });

        let response = self
            .http
            .post(&url)
            .timeout(request.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&ChatCompletionBody {
                model: &self.model,
                messages,
                max_tokens: request.max_tokens,
                temperature: request.temperature,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RxError::Timeout(request.timeout)
                } else {
                    RxError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => RxError::AuthenticationFailed,
                429 => RxError::RateLimited { retry_after: None },
                code => RxError::Api {
                    status: code,
                    message: response_sample(&message),
                },
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RxError::Http(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(RxError::EmptyResponse)
    }
}

/// Truncate a raw model response for log output.
///
/// Malformed responses are logged with a sample, never in full — they
/// can be arbitrarily large.
pub(crate) fn response_sample(text: &str) -> String {
    const SAMPLE_CHARS: usize = 120;
    if text.chars().count() <= SAMPLE_CHARS {
        text.to_string()
    } else {
        let mut sample: String = text.chars().take(SAMPLE_CHARS).collect();
        sample.push('…');
        sample
    }
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_passes_short_text_through() {
        assert_eq!(response_sample("short"), "short");
    }

    #[test]
    fn sample_truncates_long_text() {
        let long = "x".repeat(500);
        let sample = response_sample(&long);
        assert_eq!(sample.chars().count(), 121);
        assert!(sample.ends_with('…'));
    }

    #[test]
    fn parse_completion_response() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"[\"metformin\"]"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some(r#"["metformin"]"#)
        );
    }

    #[test]
    fn parse_completion_response_without_choices() {
        let parsed: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());
    }
}
