use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::providers::CapabilityError;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Media storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            AppError::Capability(ref e) => {
                tracing::error!(error = %e, "Capability failure reached the HTTP boundary");
                (
                    StatusCode::BAD_GATEWAY,
                    "Book detection is temporarily unavailable".to_string(),
                )
            }
            AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => {
                tracing::error!(error = %self, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_their_message() {
        let response = AppError::InvalidInput("recId required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::NotFound("Upload not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_internal_errors_are_reported_generically() {
        let response =
            AppError::Internal("connection refused to 10.0.0.4".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_capability_errors_map_to_bad_gateway() {
        let response =
            AppError::Capability(CapabilityError::Unavailable("vision".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
