use crate::error::{ApiError, Result};
use serde::Deserialize;

const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Phone photos arrive base64-encoded inside the JSON body.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;
const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Service configuration, read from `APP_`-prefixed environment variables
/// (e.g. `APP_LLM_API_KEY`) on top of built-in defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_request_bytes: usize,

    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,
    pub llm_timeout_seconds: u64,

    #[serde(default)]
    pub embedding_base_url: Option<String>,
    #[serde(default)]
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub embedding_retry_attempts: u32,
    pub embedding_retry_delay_ms: u64,

    pub pinecone_api_key: String,
    pub pinecone_index_host: String,
    #[serde(default)]
    pub pinecone_namespace: Option<String>,
    pub content_field: String,

    pub top_k: usize,
    pub max_recommendations: usize,
    pub expand_query: bool,

    pub image_bucket: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_env_source(config::Environment::with_prefix("APP"))
    }

    /// Load configuration from the given environment source. Tests pass a
    /// source backed by an in-memory map instead of the process environment.
    pub fn from_env_source(env: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080_i64)?
            .set_default("max_request_bytes", DEFAULT_MAX_REQUEST_BYTES as i64)?
            .set_default("llm_base_url", DEFAULT_LLM_BASE_URL)?
            .set_default("llm_api_key", "")?
            .set_default("llm_model", DEFAULT_LLM_MODEL)?
            .set_default("llm_max_tokens", 2048_i64)?
            .set_default("llm_temperature", 0.3_f64)?
            .set_default("llm_timeout_seconds", 60_i64)?
            .set_default("embedding_model", DEFAULT_EMBEDDING_MODEL)?
            .set_default("embedding_retry_attempts", 3_i64)?
            .set_default("embedding_retry_delay_ms", 500_i64)?
            .set_default("pinecone_api_key", "")?
            .set_default("pinecone_index_host", "")?
            .set_default("content_field", "text")?
            .set_default("top_k", 5_i64)?
            .set_default("max_recommendations", 3_i64)?
            .set_default("expand_query", false)?
            .set_default("image_bucket", "food-rec-dataset")?
            .add_source(env.try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("APP_LLM_API_KEY", &self.llm_api_key),
            ("APP_PINECONE_API_KEY", &self.pinecone_api_key),
            ("APP_PINECONE_INDEX_HOST", &self.pinecone_index_host),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ApiError::ConfigError(format!("{} must be set", name)));
            }
        }

        if self.max_request_bytes == 0 {
            return Err(ApiError::ConfigError(
                "APP_MAX_REQUEST_BYTES must be at least 1".into(),
            ));
        }
        if self.embedding_retry_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ApiError::ConfigError(format!(
                "APP_EMBEDDING_RETRY_ATTEMPTS must be at most {}",
                MAX_RETRY_ATTEMPTS
            )));
        }
        if self.top_k == 0 {
            return Err(ApiError::ConfigError("APP_TOP_K must be at least 1".into()));
        }
        if self.max_recommendations == 0 {
            return Err(ApiError::ConfigError(
                "APP_MAX_RECOMMENDATIONS must be at least 1".into(),
            ));
        }

        Ok(())
    }

    pub fn embedding_base_url(&self) -> &str {
        self.embedding_base_url
            .as_deref()
            .unwrap_or(&self.llm_base_url)
    }

    pub fn embedding_api_key(&self) -> &str {
        self.embedding_api_key
            .as_deref()
            .unwrap_or(&self.llm_api_key)
    }
}
