pub mod assistant;
pub mod normalizer;
pub mod pinecone;
pub mod prompts;
pub mod recommendation;
pub mod relevance;
pub mod retriever;
pub mod summarizer;

// Re-export public types
pub use assistant::{AssistantReply, MenuAssistant};
pub use normalizer::QueryNormalizer;
pub use pinecone::PineconeClient;
pub use recommendation::{
    PipelineResult, PipelineSettings, RecommendationOutcome, RecommendationService,
};
pub use relevance::RelevanceFilter;
pub use retriever::{PineconeRetriever, SimilarityRetriever};
pub use summarizer::Summarizer;
