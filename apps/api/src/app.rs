use crate::{
    config::Config,
    error::Result,
    handlers::recommendations::ImageBucket,
    ml::{ChatCompletionsClient, ChatModel, EmbeddingClient},
    routes::{api_routes, json_config},
    services::{
        MenuAssistant, PineconeClient, PineconeRetriever, PipelineSettings, RecommendationService,
        SimilarityRetriever,
    },
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::info;
use std::net::TcpListener;
use std::sync::Arc;

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        let bind_address = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}", bind_address);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        // The model and index clients are built once and shared by every request
        let model: Arc<dyn ChatModel> = Arc::new(
            ChatCompletionsClient::new(&self.config).context("Failed to initialize chat model")?,
        );

        let embedder =
            EmbeddingClient::new(&self.config).context("Failed to initialize embedding client")?;
        let pinecone = PineconeClient::new(
            &self.config.pinecone_api_key,
            &self.config.pinecone_index_host,
            self.config.pinecone_namespace.clone(),
        )
        .context("Failed to initialize Pinecone client")?;
        let retriever: Arc<dyn SimilarityRetriever> = Arc::new(PineconeRetriever::new(
            embedder,
            pinecone,
            &self.config.content_field,
        ));

        let settings = PipelineSettings::from_config(&self.config);
        info!(
            "Pipeline settings: top_k={}, max_recommendations={}, expand_query={}",
            settings.top_k, settings.max_recommendations, settings.expand_query
        );

        let recommendation_service = web::Data::new(RecommendationService::new(
            model.clone(),
            retriever,
            settings,
        ));
        let assistant = web::Data::new(MenuAssistant::new(model));
        let bucket = web::Data::new(ImageBucket(self.config.image_bucket.clone()));
        let max_request_bytes = self.config.max_request_bytes;

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header();

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(recommendation_service.clone())
                .app_data(assistant.clone())
                .app_data(bucket.clone())
                .app_data(json_config(max_request_bytes))
                .service(api_routes())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}
