use crate::error::{ApiError, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PineconeClient {
    client: Client,
    index_host: String,
    namespace: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
    pub vector: &'a [f32],
    pub top_k: usize,
    pub include_values: bool,
    pub include_metadata: bool,
}

#[derive(Debug, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<QueryMatch>,
}

impl PineconeClient {
    pub fn new(api_key: &str, index_host: &str, namespace: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(api_key)
                .map_err(|_| ApiError::ConfigError("Pinecone API key is not a valid header".into()))?,
        );
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        let index_host = if index_host.starts_with("http://") || index_host.starts_with("https://")
        {
            index_host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", index_host.trim_end_matches('/'))
        };

        Ok(Self {
            client,
            index_host,
            namespace: namespace.filter(|ns| !ns.trim().is_empty()),
        })
    }

    /// Nearest-neighbour query; matches come back best first.
    pub async fn query(&self, vector: &[f32], top_k: usize) -> Result<QueryResponse> {
        let request = QueryRequest {
            namespace: self.namespace.as_deref(),
            vector,
            top_k,
            include_values: false,
            include_metadata: true,
        };

        let response = self
            .client
            .post(format!("{}/query", self.index_host))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::ExternalServiceError(format!(
                "Pinecone query failed ({}): {}",
                status, error_text
            )));
        }

        let query_response = response.json().await?;
        Ok(query_response)
    }
}
