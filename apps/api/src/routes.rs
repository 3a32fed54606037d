use actix_web::{web, Scope};

use crate::handlers::{assistant_config, health_check, recommendations_config};

/// JSON extractor settings. Dish photos arrive base64-encoded in the body, so
/// the limit sits well above actix-web's default.
pub fn json_config(max_request_bytes: usize) -> web::JsonConfig {
    web::JsonConfig::default().limit(max_request_bytes)
}

/// Configure all routes for the API
pub fn api_routes() -> Scope {
    web::scope("/api")
        .service(health_check)
        .configure(recommendations_config)
        .configure(assistant_config)
}
