use crate::{
    error::ApiError,
    models::{
        normalize_storage_key, RecommendationRequest, RecommendationResponse,
        RecommendationStatus, RecommendedDish,
    },
    services::{PipelineResult, RecommendationOutcome, RecommendationService},
};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};
use indexmap::IndexMap;
use tracing::{info, Instrument};
use uuid::Uuid;

const NO_CANDIDATES_MESSAGE: &str = "No dishes found.";
const NO_RELEVANT_MESSAGE: &str =
    "Found items, but none passed relevance filtering. Try a broader query.";

/// Object-store bucket holding the dish images.
#[derive(Debug, Clone)]
pub struct ImageBucket(pub String);

pub fn recommendations_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/recommendations").route(web::post().to(get_recommendations)));
}

/// Recommend up to three dishes for a craving and/or a dish photo
pub async fn get_recommendations(
    request: Json<RecommendationRequest>,
    recommendation_service: web::Data<RecommendationService>,
    bucket: web::Data<ImageBucket>,
) -> Result<HttpResponse, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("recommend", %request_id);

    let result = recommendation_service
        .recommend(&request.query, request.image.as_ref())
        .instrument(span.clone())
        .await?;

    let response = build_response(request_id, result, &bucket.0);
    span.in_scope(|| {
        info!(
            "Responding with status {:?} and {} recommendations",
            response.status,
            response.recommendations.len()
        )
    });

    Ok(HttpResponse::Ok().json(response))
}

fn build_response(request_id: Uuid, result: PipelineResult, bucket: &str) -> RecommendationResponse {
    let PipelineResult { query, outcome } = result;

    match outcome {
        RecommendationOutcome::NoCandidates => RecommendationResponse {
            request_id,
            status: RecommendationStatus::NoCandidates,
            message: Some(NO_CANDIDATES_MESSAGE.to_string()),
            query,
            recommendations: Vec::new(),
            dishes: IndexMap::new(),
        },
        RecommendationOutcome::NoRelevantMatches { .. } => RecommendationResponse {
            request_id,
            status: RecommendationStatus::NoRelevantMatches,
            message: Some(NO_RELEVANT_MESSAGE.to_string()),
            query,
            recommendations: Vec::new(),
            dishes: IndexMap::new(),
        },
        RecommendationOutcome::Matches(set) => {
            let recommendations = set
                .recommendations
                .into_iter()
                .map(|recommendation| {
                    let dish = recommendation.candidate.metadata;
                    let image_key = dish.image_key();
                    RecommendedDish {
                        summary: recommendation.summary,
                        storage_key: normalize_storage_key(&image_key, bucket),
                        image_key,
                        dish,
                    }
                })
                .collect();

            RecommendationResponse {
                request_id,
                status: RecommendationStatus::Ok,
                message: None,
                query,
                recommendations,
                dishes: set.dishes,
            }
        }
    }
}
