use crate::error::{ApiError, Result};
use crate::ml::EmbeddingClient;
use crate::models::{Candidate, DishMetadata};
use crate::services::pinecone::{PineconeClient, QueryMatch};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Similarity search over the prebuilt dish index.
#[async_trait]
pub trait SimilarityRetriever: Send + Sync {
    /// Return up to `k` candidates ranked best first. An empty result is
    /// not an error.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Candidate>>;
}

/// Retriever backed by an embedding endpoint and a Pinecone index.
pub struct PineconeRetriever {
    embedder: EmbeddingClient,
    pinecone: PineconeClient,
    content_field: String,
}

impl PineconeRetriever {
    pub fn new(embedder: EmbeddingClient, pinecone: PineconeClient, content_field: &str) -> Self {
        Self {
            embedder,
            pinecone,
            content_field: content_field.to_string(),
        }
    }
}

#[async_trait]
impl SimilarityRetriever for PineconeRetriever {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Candidate>> {
        if k == 0 {
            return Err(ApiError::InvalidInput("k must be at least 1".to_string()));
        }

        let embedding = self.embedder.encode(query).await?;
        let response = self.pinecone.query(&embedding, k).await?;
        info!(
            "Pinecone returned {} matches for k={}",
            response.matches.len(),
            k
        );

        let mut candidates = Vec::with_capacity(response.matches.len());
        for query_match in response.matches.into_iter().take(k) {
            debug!("Match {} scored {:.4}", query_match.id, query_match.score);
            match candidate_from_match(query_match, &self.content_field) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => warn!("Skipping malformed index record: {}", e),
            }
        }

        Ok(candidates)
    }
}

/// Split a match's metadata into the dish text and the remaining fields.
fn candidate_from_match(query_match: QueryMatch, content_field: &str) -> Result<Candidate> {
    let mut metadata = query_match.metadata.unwrap_or_default();

    let content = match metadata.remove(content_field) {
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
        None => {
            return Err(ApiError::SerializationError(format!(
                "record {} has no '{}' field",
                query_match.id, content_field
            )))
        }
    };

    let metadata: DishMetadata = serde_json::from_value(Value::Object(metadata))?;
    Ok(Candidate::new(content, metadata))
}
