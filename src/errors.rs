use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database call timed out")]
    Timeout,

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Todo not found")]
    NotFound,

    #[error("Validation Error: {0}")]
    ValidationError(String),
}

impl AppError {
    /// Short machine-readable code sent in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "backend_error",
            AppError::Timeout => "backend_timeout",
            AppError::Config(_) => "config_error",
            AppError::InvalidIdentifier(_) => "invalid_identifier",
            AppError::NotFound => "not_found",
            AppError::ValidationError(_) => "validation_error",
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidIdentifier(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Timeout => {
                tracing::error!("Database call timed out");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service Unavailable".to_string(),
                )
            }
            AppError::InvalidIdentifier(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Resource Not Found".to_string()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (
            status,
            Json(json!({ "error": self.kind(), "message": message })),
        )
            .into_response()
    }
}
