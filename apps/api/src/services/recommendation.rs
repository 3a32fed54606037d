use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::ml::ChatModel;
use crate::models::{DishMetadata, ImageUpload, Recommendation, RecommendationSet};
use crate::services::{
    normalizer::QueryNormalizer, relevance::RelevanceFilter, retriever::SimilarityRetriever,
    summarizer::Summarizer,
};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Candidates requested from the retriever
    pub top_k: usize,
    /// Most recommendations returned per request
    pub max_recommendations: usize,
    /// Rewrite the query as search keywords before retrieval
    pub expand_query: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
            expand_query: false,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.top_k,
            max_recommendations: config.max_recommendations,
            expand_query: config.expand_query,
        }
    }
}

/// How a recommendation request ended. The two empty outcomes are normal
/// results, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    /// Retrieval returned nothing; filter and summarizer were not called.
    NoCandidates,
    /// Candidates were found but none passed the relevance filter.
    NoRelevantMatches { examined: usize },
    Matches(RecommendationSet),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    /// The query that was sent to retrieval
    pub query: String,
    pub outcome: RecommendationOutcome,
}

/// Normalize, retrieve, filter, summarize.
///
/// Holds no per-request state; the model and retriever are shared, caller-owned
/// collaborators.
#[derive(Clone)]
pub struct RecommendationService {
    retriever: Arc<dyn SimilarityRetriever>,
    normalizer: QueryNormalizer,
    relevance: RelevanceFilter,
    summarizer: Summarizer,
    settings: PipelineSettings,
}

impl RecommendationService {
    pub fn new(
        model: Arc<dyn ChatModel>,
        retriever: Arc<dyn SimilarityRetriever>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            retriever,
            normalizer: QueryNormalizer::new(model.clone()),
            relevance: RelevanceFilter::new(model.clone()),
            summarizer: Summarizer::new(model),
            settings,
        }
    }

    pub async fn recommend(&self, text: &str, image: Option<&ImageUpload>) -> Result<PipelineResult> {
        let text = text.trim();
        if text.is_empty() && image.is_none() {
            return Err(ApiError::InvalidInput(
                "Provide a craving, a dish image, or both".to_string(),
            ));
        }

        let normalized = self.normalizer.normalize(text, image).await?;
        if normalized.is_empty() {
            warn!("Image description came back empty; nothing to search for");
            return Ok(PipelineResult {
                query: normalized,
                outcome: RecommendationOutcome::NoCandidates,
            });
        }

        let query = if self.settings.expand_query {
            let keywords = self.normalizer.expand_keywords(&normalized).await?;
            if keywords.is_empty() {
                normalized.clone()
            } else {
                keywords
            }
        } else {
            normalized.clone()
        };

        let candidates = self
            .retriever
            .similarity_search(&query, self.settings.top_k)
            .await?;
        info!("Retrieved {} candidates for '{}'", candidates.len(), query);

        if candidates.is_empty() {
            return Ok(PipelineResult {
                query,
                outcome: RecommendationOutcome::NoCandidates,
            });
        }

        // Image-only requests have no stated preference; judge against the
        // image description instead.
        let preference = if text.is_empty() {
            normalized.as_str()
        } else {
            text
        };

        let filtered = self
            .relevance
            .filter(candidates, preference, self.settings.max_recommendations)
            .await?;

        if filtered.accepted.is_empty() {
            return Ok(PipelineResult {
                query,
                outcome: RecommendationOutcome::NoRelevantMatches {
                    examined: filtered.examined,
                },
            });
        }

        let recommendations = self
            .summarizer
            .summarize_all(filtered.accepted, preference)
            .await?;
        let dishes = key_by_image(&recommendations);

        if dishes.len() < recommendations.len() {
            warn!(
                "{} accepted dishes share an image reference; the keyed view keeps {}",
                recommendations.len(),
                dishes.len()
            );
        }

        Ok(PipelineResult {
            query,
            outcome: RecommendationOutcome::Matches(RecommendationSet {
                recommendations,
                dishes,
            }),
        })
    }
}

/// Key accepted dishes by image reference. A later dish with an already-seen
/// reference overwrites the earlier metadata in place.
fn key_by_image(recommendations: &[Recommendation]) -> IndexMap<String, DishMetadata> {
    recommendations
        .iter()
        .fold(IndexMap::new(), |mut dishes, recommendation| {
            let metadata = &recommendation.candidate.metadata;
            dishes.insert(metadata.image_key(), metadata.clone());
            dishes
        })
}
