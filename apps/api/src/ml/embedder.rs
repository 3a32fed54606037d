use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::ml::chat_model::preview;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_CONNECTION_TIMEOUT_SECONDS: u64 = 15;

/// Client for an OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model_name: String,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_seconds))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECONDS))
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/embeddings",
            config.embedding_base_url().trim_end_matches('/')
        );

        Ok(Self {
            client,
            api_key: config.embedding_api_key().to_string(),
            endpoint,
            model_name: config.embedding_model.clone(),
            retry_attempts: config.embedding_retry_attempts.max(1),
            retry_delay_ms: config.embedding_retry_delay_ms,
        })
    }

    /// Embed a single text, retrying transient failures with exponential backoff.
    pub async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let input = text.trim();
        if input.is_empty() {
            return Err(ApiError::InvalidInput("Cannot embed empty text".to_string()));
        }

        debug!("Encoding text (length: {}): {}", input.len(), preview(input));

        for attempt in 1..=self.retry_attempts {
            match self.request_embedding(input).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) if attempt < self.retry_attempts && is_retryable(&e) => {
                    let delay_ms = backoff_delay_ms(self.retry_delay_ms, attempt);
                    warn!(
                        "Embedding request failed (attempt {}/{}): {}. Retrying in {}ms",
                        attempt, self.retry_attempts, e, delay_ms
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(ApiError::ModelError(
            "All retry attempts failed when encoding text".to_string(),
        ))
    }

    async fn request_embedding(&self, input: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model_name,
            input,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ApiError::ExternalServiceError(format!("Embedding request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => ApiError::ModelError(
                    "Authentication failed. Please check the embedding API key.".to_string(),
                ),
                404 => ApiError::ModelError(format!(
                    "Embedding model not found: {}",
                    self.model_name
                )),
                _ => ApiError::ExternalServiceError(format!(
                    "Embedding API returned non-success status: {} - {}",
                    status, text
                )),
            });
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            ApiError::SerializationError(format!("Failed to parse embedding response: {}", e))
        })?;

        extract_embedding(body)
    }
}

fn extract_embedding(response: EmbeddingResponse) -> Result<Vec<f32>> {
    let embedding = response
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .unwrap_or_default();

    if embedding.is_empty() {
        return Err(ApiError::ModelError(
            "Failed to extract embedding from response".to_string(),
        ));
    }

    debug!("Got embedding of size {}", embedding.len());
    Ok(embedding)
}

/// Authentication and missing-model failures will not heal on retry.
/// Delay before retrying after the given (1-based) failed attempt.
fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

fn is_retryable(err: &ApiError) -> bool {
    matches!(err, ApiError::ExternalServiceError(_))
}
