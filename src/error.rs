//! Unified error handling for freegate.
//!
//! Provides a consistent error type across the router, key store and HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Unified error type for gateway operations.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Request rejected before any provider was contacted.
    InvalidInput(String),
    /// Every provider in the resolved sequence failed.
    AllProvidersExhausted {
        model: String,
        attempts: usize,
        last_error: String,
    },
    /// An upstream answer that could not be interpreted. Never retried.
    UpstreamUnexpected(String),
    /// No credentials supplied.
    Unauthorized(String),
    /// Credentials supplied but rejected.
    Forbidden(String),
    /// Referenced resource does not exist.
    NotFound(String),
    /// API-key store failure.
    Storage(String),
    /// Configuration error.
    Config(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "{}", msg),
            Self::AllProvidersExhausted {
                model,
                attempts,
                last_error,
            } => write!(
                f,
                "All providers for model {} failed after {} attempt(s). Last error: {}",
                model, attempts, last_error
            ),
            Self::UpstreamUnexpected(msg) => write!(f, "Unexpected upstream response: {}", msg),
            Self::Unauthorized(msg) => write!(f, "{}", msg),
            Self::Forbidden(msg) => write!(f, "{}", msg),
            Self::NotFound(msg) => write!(f, "{}", msg),
            Self::Storage(msg) => write!(f, "Storage error: {}", msg),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<rusqlite::Error> for GatewayError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Error response body: `{"success": false, "error": "...", "type": "..."}`.
#[derive(Serialize)]
struct ErrorResponseBody {
    success: bool,
    error: String,
    r#type: &'static str,
}

impl GatewayError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::AllProvidersExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamUnexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_request",
            Self::AllProvidersExhausted { .. } => "providers_exhausted",
            Self::UpstreamUnexpected(_) => "upstream_error",
            Self::Unauthorized(_) => "authentication_error",
            Self::Forbidden(_) => "permission_error",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage_error",
            Self::Config(_) => "configuration_error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorResponseBody {
            success: false,
            error: self.to_string(),
            r#type: self.error_type(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}
