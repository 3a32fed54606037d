use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrScalar {
        String(String),
        Number(serde_json::Number),
        Bool(bool),
        Null,
    }

    match Option::<TextOrScalar>::deserialize(deserializer)? {
        Some(TextOrScalar::String(s)) => Ok(Some(s)),
        Some(TextOrScalar::Number(n)) => Ok(Some(n.to_string())),
        Some(TextOrScalar::Bool(b)) => Ok(Some(b.to_string())),
        Some(TextOrScalar::Null) | None => Ok(None),
    }
}

fn serialize_or_empty<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

/// Metadata stored alongside each dish vector in the index.
///
/// Every field is optional in the index and may arrive as a string, a number
/// or null. Absent fields serialize as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DishMetadata {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        serialize_with = "serialize_or_empty"
    )]
    pub image_path: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        serialize_with = "serialize_or_empty"
    )]
    pub restaurant_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        serialize_with = "serialize_or_empty"
    )]
    pub menu_item_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        serialize_with = "serialize_or_empty"
    )]
    pub nutrition: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        serialize_with = "serialize_or_empty"
    )]
    pub calories: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        serialize_with = "serialize_or_empty"
    )]
    pub price: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        serialize_with = "serialize_or_empty"
    )]
    pub average_rating: Option<String>,
    /// Index metadata this service does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DishMetadata {
    /// The image reference used to key accepted dishes. Missing references
    /// all share the empty key.
    pub fn image_key(&self) -> String {
        self.image_path.clone().unwrap_or_default()
    }
}

/// A dish record returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Free-text description used for relevance judgement and summaries.
    pub content: String,
    pub metadata: DishMetadata,
}

impl Candidate {
    pub fn new(content: impl Into<String>, metadata: DishMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// An accepted candidate paired with its generated summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub summary: String,
    pub candidate: Candidate,
}

/// The accepted dishes of one request.
///
/// `recommendations` holds every accepted candidate in retrieval order.
/// `dishes` maps image reference to metadata in acceptance order; a later
/// dish with the same image reference replaces the earlier entry, so it can
/// hold fewer entries than `recommendations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<Recommendation>,
    pub dishes: IndexMap<String, DishMetadata>,
}

impl RecommendationSet {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.recommendations.len()
    }
}

/// Normalize an image reference into an object key under `images/`.
///
/// Accepts `images/R010/R010M003.png`, `R010/R010M003.png` and
/// `s3://<bucket>/images/R010/R010M003.png`. A missing reference yields an
/// empty key.
pub fn normalize_storage_key(image_path: &str, bucket: &str) -> String {
    let bucket_prefix = format!("s3://{}/", bucket);
    let path = image_path.trim().replace(&bucket_prefix, "");
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        String::new()
    } else if path.starts_with("images/") {
        path.to_string()
    } else {
        format!("images/{}", path)
    }
}
