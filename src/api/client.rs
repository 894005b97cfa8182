//! HTTP access to the chat-completions and moderations endpoints.
//!
//! The chat loop only ever talks to the [`ChatApi`] trait, so tests can
//! substitute a scripted collaborator for the real network.

use async_trait::async_trait;

use crate::api::{
    ChatMessage, ChatRequest, ChatResponse, ModerationRequest, ModerationResponse, ResponseFormat,
};
use crate::core::constants::{MAX_COMPLETION_TOKENS, TEMPERATURE};
use crate::utils::url::endpoint_url;

pub type ApiError = Box<dyn std::error::Error + Send + Sync>;

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatResponse, ApiError>;

    async fn moderate(&self, model: &str, input: &str) -> Result<ModerationResponse, ApiError>;
}

pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpChatApi {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    async fn post_json<T: serde::Serialize>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> Result<reqwest::Response, ApiError> {
        let url = endpoint_url(&self.base_url, endpoint);
        tracing::debug!(%url, "sending API request");

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(format_api_error(status.as_u16(), &error_text).into());
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatResponse, ApiError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
            response_format: ResponseFormat::json_object(),
        };

        let response = self.post_json("chat/completions", &request).await?;
        Ok(response.json::<ChatResponse>().await?)
    }

    async fn moderate(&self, model: &str, input: &str) -> Result<ModerationResponse, ApiError> {
        let request = ModerationRequest {
            model: model.to_string(),
            input: input.to_string(),
        };

        let response = self.post_json("moderations", &request).await?;
        Ok(response.json::<ModerationResponse>().await?)
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Collapse an HTTP error body into a single status line, preferring the
/// provider's own error message when the body is JSON.
fn format_api_error(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("API request failed with status {status}");
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&value) {
            if !summary.is_empty() {
                return format!("API request failed with status {status}: {summary}");
            }
        }
    }

    format!("API request failed with status {status}: {trimmed}")
}
