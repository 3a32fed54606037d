use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use dish::{normalize_storage_key, Candidate, DishMetadata, Recommendation, RecommendationSet};

mod dish;

/// An uploaded dish photo, carried inline as base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUpload {
    /// Standard base64 encoding of the image bytes
    pub data: String,
    /// Original file name, used to guess the media type
    #[serde(default)]
    pub filename: Option<String>,
    /// Explicit media type, e.g. `image/png`
    #[serde(default)]
    pub media_type: Option<String>,
}

/// Request structure for dish recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// What the user is craving; may be empty when an image is given
    #[serde(default)]
    pub query: String,
    /// Optional dish photo
    #[serde(default)]
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Ok,
    NoCandidates,
    NoRelevantMatches,
}

/// One recommended dish as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedDish {
    pub summary: String,
    pub image_key: String,
    /// Object-store key of the dish image
    pub storage_key: String,
    pub dish: DishMetadata,
}

/// Response structure for dish recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub request_id: Uuid,
    pub status: RecommendationStatus,
    pub message: Option<String>,
    /// The normalized query sent to retrieval
    pub query: String,
    pub recommendations: Vec<RecommendedDish>,
    /// Accepted dish metadata keyed by image reference
    pub dishes: IndexMap<String, DishMetadata>,
}

/// Request structure for the menu assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantRequest {
    /// Menu context the answer must be grounded in
    #[serde(default)]
    pub context: String,
    pub message: String,
}

/// Response structure for the menu assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantResponse {
    /// "yes" when a recommendation could be made from the context
    pub recommendation: String,
    pub response: String,
    /// Whether the model output decoded as a structured decision
    pub structured: bool,
}

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
}
