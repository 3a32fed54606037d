use crate::error::{ApiError, Result};
use crate::ml::ChatModel;
use crate::models::ImageUpload;
use crate::services::prompts;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Fuses the user's text and an optional dish photo into one search query.
#[derive(Clone)]
pub struct QueryNormalizer {
    model: Arc<dyn ChatModel>,
}

impl QueryNormalizer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Build the retrieval query. With an image, its food-only description
    /// is appended to the text, separated by a space. Model errors propagate.
    pub async fn normalize(&self, text: &str, image: Option<&ImageUpload>) -> Result<String> {
        let mut query = text.trim().to_string();

        if let Some(image) = image {
            let description = self.describe_image(image).await?;
            if !description.is_empty() {
                if !query.is_empty() {
                    query.push(' ');
                }
                query.push_str(&description);
            }
        }

        info!("Normalized query: '{}'", query);
        Ok(query)
    }

    /// Ask the model for a concise, keyword-dense description of the food
    /// in the image.
    pub async fn describe_image(&self, image: &ImageUpload) -> Result<String> {
        let data_url = image_data_url(image)?;
        let reply = self
            .model
            .invoke(&prompts::image_description(&data_url))
            .await?;

        let description = reply.trim().to_string();
        debug!("Image description: {}", description);
        Ok(description)
    }

    /// Rewrite a query as comma-separated search keywords.
    pub async fn expand_keywords(&self, query: &str) -> Result<String> {
        let reply = self.model.invoke(&prompts::query_expansion(query)).await?;
        let keywords = reply.trim().to_string();
        debug!("Expanded '{}' into '{}'", query, keywords);
        Ok(keywords)
    }
}

/// Encode an upload as a `data:<mime>;base64,<data>` URL after checking
/// that the payload is non-empty base64.
pub fn image_data_url(image: &ImageUpload) -> Result<String> {
    let data: String = image.data.split_whitespace().collect();
    let bytes = STANDARD.decode(&data)?;
    if bytes.is_empty() {
        return Err(ApiError::InvalidInput("image data is empty".to_string()));
    }

    let media_type = image
        .media_type
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .or_else(|| image.filename.as_deref().and_then(guess_media_type))
        .unwrap_or(DEFAULT_MEDIA_TYPE);

    Ok(format!("data:{};base64,{}", media_type, data))
}

pub fn guess_media_type(filename: &str) -> Option<&'static str> {
    let (_, extension) = filename.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::prompts::IMAGE_DESCRIPTION_SYSTEM;
    use crate::test_support::ScriptedModel;

    fn upload(filename: Option<&str>) -> ImageUpload {
        ImageUpload {
            data: STANDARD.encode(b"\x89PNG fake image bytes"),
            filename: filename.map(str::to_string),
            media_type: None,
        }
    }

    #[test]
    fn test_data_url_uses_filename_extension() {
        let url = image_data_url(&upload(Some("ramen.JPG"))).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_data_url_prefers_explicit_media_type() {
        let mut image = upload(Some("ramen.jpg"));
        image.media_type = Some("image/png".into());
        assert!(image_data_url(&image)
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_data_url_falls_back_to_octet_stream() {
        let url = image_data_url(&upload(Some("scan"))).unwrap();
        assert!(url.starts_with("data:application/octet-stream;base64,"));
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let image = ImageUpload {
            data: "%%% not base64 %%%".into(),
            filename: None,
            media_type: None,
        };
        assert!(matches!(
            image_data_url(&image),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_text_only_query_makes_no_model_call() {
        let model = Arc::new(ScriptedModel::always("unused"));
        let normalizer = QueryNormalizer::new(model.clone());

        let query = normalizer.normalize("  spicy noodles ", None).await.unwrap();

        assert_eq!(query, "spicy noodles");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_image_description_is_appended() {
        let model = Arc::new(ScriptedModel::always(
            "  Dan Dan noodles, Sichuan, chili oil, minced pork  ",
        ));
        let normalizer = QueryNormalizer::new(model.clone());

        let query = normalizer
            .normalize("spicy noodles", Some(&upload(Some("dish.png"))))
            .await
            .unwrap();

        assert_eq!(
            query,
            "spicy noodles Dan Dan noodles, Sichuan, chili oil, minced pork"
        );
        assert_eq!(model.calls_with_system(IMAGE_DESCRIPTION_SYSTEM), 1);
        assert!(model.calls()[0][1].has_image());
    }

    #[tokio::test]
    async fn test_image_only_query_is_the_description() {
        let model = Arc::new(ScriptedModel::always("Mango sticky rice, Thai, coconut"));
        let normalizer = QueryNormalizer::new(model);

        let query = normalizer
            .normalize("", Some(&upload(Some("dessert.webp"))))
            .await
            .unwrap();

        assert_eq!(query, "Mango sticky rice, Thai, coconut");
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let model = Arc::new(ScriptedModel::failing());
        let normalizer = QueryNormalizer::new(model);

        let result = normalizer
            .normalize("noodles", Some(&upload(Some("dish.png"))))
            .await;

        assert!(matches!(result, Err(ApiError::ModelError(_))));
    }
}
