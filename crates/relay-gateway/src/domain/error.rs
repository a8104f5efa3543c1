//! Gateway error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error returned by a handler.
///
/// | Variant | Status | Body |
/// |---------|--------|------|
/// | `BadRequest` | 400 | `{error}` |
/// | `RelayFailed` | 500 | `{success: false, error}` |
/// | `Internal` | 500 | `{error: "Internal server error"}` |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("relay failed: {0}")]
    RelayFailed(String),

    /// Cause is logged by the handler, never returned.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RelayFailed(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(message) => json!({ "error": message }),
            ApiError::RelayFailed(message) => json!({ "success": false, "error": message }),
            ApiError::Internal => json!({ "error": "Internal server error" }),
        };
        (status, Json(body)).into_response()
    }
}

/// Gateway-level errors (not returned to clients)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server terminated abnormally
    #[error("server error: {0}")]
    Server(String),
}
