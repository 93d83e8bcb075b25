//! services/api/src/error.rs
//!
//! Defines the error types for the API service: `ApiError` for startup and
//! wiring failures, `AppError` for failures surfaced to HTTP clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use booknotes_core::ports::PortError;
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;

/// The primary error type for starting the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// An error returned from a request handler, rendered as `{ "error": message }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthConflict(String),
    #[error("Invalid email, username or password")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("External service error: {0}")]
    ExternalService(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("You need to be logged in to do that.".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthConflict(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PortError> for AppError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::NotFound(msg) => AppError::NotFound(msg),
            PortError::Conflict(msg) => AppError::Conflict(msg),
            PortError::InvalidCredentials => AppError::InvalidCredentials,
            PortError::Unauthorized => AppError::unauthorized(),
            PortError::BadRequest(msg) => AppError::BadRequest(msg),
            PortError::External(msg) => AppError::ExternalService(msg),
            PortError::Unexpected(msg) => AppError::Database(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server-side causes are logged but not echoed to the client.
        let message = match &self {
            AppError::Database(cause) | AppError::Internal(cause) => {
                error!("Request failed: {}", cause);
                "Internal server error".to_string()
            }
            AppError::ExternalService(cause) => {
                error!("Generative service failed: {}", cause);
                "The AI service could not complete the request".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
