use crate::{
    error::ApiError,
    models::{AssistantRequest, AssistantResponse},
    services::MenuAssistant,
};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};

pub fn assistant_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/assistant").route(web::post().to(ask_assistant)));
}

/// Answer a free-form question against a menu context
pub async fn ask_assistant(
    request: Json<AssistantRequest>,
    assistant: web::Data<MenuAssistant>,
) -> Result<HttpResponse, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::InvalidInput("Message cannot be empty".to_string()));
    }

    let reply = assistant
        .respond(&request.context, request.message.trim())
        .await?;

    Ok(HttpResponse::Ok().json(AssistantResponse {
        recommendation: if reply.recommends() { "yes" } else { "no" }.to_string(),
        response: reply.response().to_string(),
        structured: reply.is_structured(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn ask(model_reply: &str, body: Value) -> (StatusCode, Value) {
        let assistant = MenuAssistant::new(Arc::new(ScriptedModel::always(model_reply)));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(assistant))
                .service(web::scope("/api").configure(assistant_config)),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/api/assistant")
            .set_json(body)
            .to_request();
        let response = test::call_service(&app, request).await;
        let status = response.status();
        (status, test::read_body_json(response).await)
    }

    #[actix_web::test]
    async fn test_structured_answer() {
        let (status, body) = ask(
            r#"{"recommendation": "yes", "response": "Order the green curry."}"#,
            json!({"context": "green curry, pad thai", "message": "something spicy"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "recommendation": "yes",
                "response": "Order the green curry.",
                "structured": true
            })
        );
    }

    #[actix_web::test]
    async fn test_malformed_answer_degrades() {
        let (status, body) = ask(
            "Do you prefer rice or noodles?",
            json!({"context": "green curry, pad thai", "message": "hungry"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recommendation"], "no");
        assert_eq!(body["response"], "Do you prefer rice or noodles?");
        assert_eq!(body["structured"], false);
    }

    #[actix_web::test]
    async fn test_empty_message_is_rejected() {
        let (status, _) = ask("unused", json!({"context": "menu", "message": " "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
