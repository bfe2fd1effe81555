use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::failure::ExtractionFailure;
use crate::normalizer::NormalizeError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Normalize(e) => {
                tracing::warn!("{e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNREADABLE_FILE",
                    e.user_message().to_string(),
                )
            }
            AppError::Extraction(failure) => {
                let status = match failure {
                    ExtractionFailure::EmptyPayload => StatusCode::BAD_REQUEST,
                    ExtractionFailure::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
                    ExtractionFailure::TransportError { .. }
                    | ExtractionFailure::UnparsableResponse { .. } => StatusCode::BAD_GATEWAY,
                };
                tracing::error!("Extraction failed: {failure}");
                (status, failure.code(), failure.user_message().to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
