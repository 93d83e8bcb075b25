//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, GeminiAdapter, LocalFileStorage, OpenAiAdapter},
    config::{Config, LlmProvider},
    error::ApiError,
    web::{rest::ApiDoc, router, state::AppState},
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use booknotes_core::ports::GenerativeService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the configured model backend.
fn generative_service(config: &Config) -> Result<Arc<dyn GenerativeService>, ApiError> {
    match config.llm_provider {
        LlmProvider::Gemini => {
            let api_key = config.gemini_api_key.clone().ok_or_else(|| {
                ApiError::Internal("GEMINI_API_KEY is required for the gemini provider".to_string())
            })?;
            let adapter =
                GeminiAdapter::new(api_key, config.gemini_model.clone(), config.llm_timeout)?;
            Ok(Arc::new(adapter))
        }
        LlmProvider::OpenAi => {
            let api_key = config.openai_api_key.as_ref().ok_or_else(|| {
                ApiError::Internal("OPENAI_API_KEY is required for the openai provider".to_string())
            })?;
            let adapter =
                OpenAiAdapter::new(api_key, config.openai_model.clone(), config.llm_timeout)?;
            Ok(Arc::new(adapter))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let ai = generative_service(&config)?;
    info!("Using {:?} as the generative backend", config.llm_provider);
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let storage = Arc::new(LocalFileStorage::new(config.upload_dir.clone()));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(db_adapter, storage, ai, config.clone()));

    // --- 5. Create the Web Router ---
    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let app = Router::new()
        .merge(router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
