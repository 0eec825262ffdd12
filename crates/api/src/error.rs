use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use labtrack_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `labtrack_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::DuplicateId(_) => {
                    (StatusCode::CONFLICT, "DUPLICATE_ID", core.to_string())
                }
                CoreError::DuplicateKind { .. } => {
                    (StatusCode::CONFLICT, "DUPLICATE_KIND", core.to_string())
                }
                CoreError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string())
                }
                CoreError::NotAMember { .. } => {
                    (StatusCode::FORBIDDEN, "NOT_A_MEMBER", core.to_string())
                }
                CoreError::AlreadyMember { .. } => {
                    (StatusCode::CONFLICT, "ALREADY_MEMBER", core.to_string())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::InvalidAmount => {
                    (StatusCode::BAD_REQUEST, "INVALID_AMOUNT", core.to_string())
                }
                CoreError::InsufficientCapacity { .. } => (
                    StatusCode::CONFLICT,
                    "INSUFFICIENT_CAPACITY",
                    core.to_string(),
                ),
                CoreError::OverRelease { .. } => {
                    (StatusCode::CONFLICT, "OVER_RELEASE", core.to_string())
                }
                CoreError::Busy(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "BUSY",
                    core.to_string(),
                ),
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
