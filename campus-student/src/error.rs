//! HTTP error type for campus-student
//!
//! Every handler returns [`ApiResult`]. Variants map one-to-one onto the
//! status codes clients act on; upstream failures are logged in full and
//! reported with a generic message only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::gateway::GatewayError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    Validation(String),

    /// No verified student identity on the request (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Payment-mode mismatch and similar refusals (403)
    #[error("{0}")]
    Security(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Capacity exceeded, duplicate enrollment, lock already set (409)
    #[error("{0}")]
    Conflict(String),

    /// Payment or webhook signature mismatch (400)
    #[error("{0}")]
    Signature(String),

    /// Persistence or payment gateway failure (500)
    #[error("{0}")]
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Security(msg) => (StatusCode::FORBIDDEN, "SECURITY_ERROR", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Signature(msg) => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE", msg),
            ApiError::Upstream(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<campus_common::Error> for ApiError {
    fn from(err: campus_common::Error) -> Self {
        match err {
            campus_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            campus_common::Error::InvalidInput(msg) => ApiError::Validation(msg),
            other => {
                tracing::error!(error = %other, "Storage operation failed");
                ApiError::Upstream("Internal server error".to_string())
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        campus_common::Error::from(err).into()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotConfigured => {
                ApiError::Upstream("Payment gateway is not configured".to_string())
            }
            other => {
                tracing::error!(error = %other, "Payment gateway call failed");
                ApiError::Upstream("Payment gateway request failed".to_string())
            }
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
