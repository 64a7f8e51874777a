use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The form controller never propagates these past the operation that raised them:
/// it stores `user_message()` next to the affected control instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// The message shown to the user, without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Lookup(msg)
            | AppError::Configuration(msg)
            | AppError::Generation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Lookup(msg) => {
                tracing::warn!("Lookup error: {msg}");
                (StatusCode::BAD_GATEWAY, "LOOKUP_ERROR")
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, "CONFIGURATION_ERROR")
            }
            AppError::Generation(msg) => {
                tracing::error!("Generation error: {msg}");
                (StatusCode::BAD_GATEWAY, "GENERATION_ERROR")
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.user_message()
            }
        }));

        (status, body).into_response()
    }
}
