//! API error types and JSON error response formatting.
//!
//! ApiError gives every endpoint the same JSON error body and maps
//! internal errors to HTTP status codes. Pipeline stage failures are not
//! ApiErrors: they travel inside the pipeline result with status 422.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parla_core::ParlaError;
use serde::Serialize;
use serde_json::json;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 422 Unprocessable Entity - well-formed input a stage could not handle.
    UnprocessableEntity(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - an upstream provider rejected the call.
    Upstream { status: u16, body: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unprocessable_entity",
                msg,
                None,
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg,
                None,
            ),
            ApiError::Upstream { status, body } => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                format!("Provider returned HTTP {}", status),
                Some(json!({ "status": status, "body": body })),
            ),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ParlaError> for ApiError {
    fn from(err: ParlaError) -> Self {
        match err {
            ParlaError::Config(msg) => ApiError::BadRequest(msg),
            ParlaError::Transcription(msg)
            | ParlaError::Generation(msg)
            | ParlaError::Synthesis(msg)
            | ParlaError::Retrieval(msg) => ApiError::UnprocessableEntity(msg),
            ParlaError::Provider { status, body } => ApiError::Upstream { status, body },
            other => ApiError::Internal(other.to_string()),
        }
    }
}
