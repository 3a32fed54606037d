use crate::config::Config;
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const MAX_TEXT_PREVIEW_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multi-part user message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// An image given as a URL, typically a `data:` URL.
    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![ContentPart::text(text)])
    }

    /// All text carried by this message, parts joined by newlines.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn has_image(&self) -> bool {
        matches!(&self.content, MessageContent::Parts(parts)
            if parts.iter().any(|p| matches!(p, ContentPart::ImageUrl { .. })))
    }
}

/// A chat-style language model.
///
/// Implementations are shared across requests and must be safe for
/// concurrent use.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the messages and return the model's text reply.
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model_name: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_seconds))
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/chat/completions",
            config.llm_base_url.trim_end_matches('/')
        );

        tracing::info!(
            "Chat model client ready: model={}, endpoint={}",
            config.llm_model,
            endpoint
        );

        Ok(Self {
            client,
            api_key: config.llm_api_key.clone(),
            endpoint,
            model_name: config.llm_model.clone(),
            max_tokens: config.llm_max_tokens,
            temperature: config.llm_temperature,
        })
    }
}

#[async_trait]
impl ChatModel for ChatCompletionsClient {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model_name,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ApiError::ModelError(format!("Failed to send request to model API: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Chat model API error {}: {}", status, body);
            return Err(status_error(status, &body, &self.model_name));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            ApiError::SerializationError(format!("Failed to parse chat completion: {}", e))
        })?;

        let content = first_choice_content(body)?;
        debug!("Model replied: {}", preview(&content));
        Ok(content)
    }
}

fn status_error(status: StatusCode, body: &str, model_name: &str) -> ApiError {
    match status.as_u16() {
        401 | 403 => ApiError::ModelError(
            "Authentication failed. Please check the language model API key.".to_string(),
        ),
        404 => ApiError::ModelError(format!(
            "Model not found: {}. Please check the model name in your configuration.",
            model_name
        )),
        429 => ApiError::ModelError(
            "Rate limit exceeded by the language model provider.".to_string(),
        ),
        _ => ApiError::ModelError(format!(
            "Chat model API returned non-success status: {} - {}",
            status, body
        )),
    }
}

fn first_choice_content(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| ApiError::ModelError("Model returned no choices".to_string()))
}

pub(crate) fn preview(text: &str) -> String {
    if text.chars().count() > MAX_TEXT_PREVIEW_LENGTH {
        let head: String = text.chars().take(MAX_TEXT_PREVIEW_LENGTH).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
