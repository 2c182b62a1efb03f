//! Boundary error type and its HTTP mapping.
//!
//! Every failure leaves the server as `{"error": code, "message": text}`.
//! Upstream response bodies are logged by the pipeline and never echoed.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use govapi_core::ExemptionError;
use serde::Serialize;

/// Errors returned by handlers and gates.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Pipeline failure.
    #[error(transparent)]
    Exemption(#[from] ExemptionError),

    /// A query parameter could not be parsed.
    #[error("{0}")]
    BadRequest(String),

    /// The server has no API key to compare against.
    #[error("API key is not configured.")]
    ApiKeyNotConfigured,

    /// The caller's `x-api-key` is missing or wrong.
    #[error("Unauthorized: Invalid or missing API key.")]
    InvalidApiKey,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Exemption(e) => match e {
                ExemptionError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                ExemptionError::Unauthorized => StatusCode::UNAUTHORIZED,
                ExemptionError::NotFound { .. } => StatusCode::NOT_FOUND,
                ExemptionError::UpdateFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                ExemptionError::Upstream { .. }
                | ExemptionError::Malformed(_)
                | ExemptionError::Transport(_)
                | ExemptionError::InvalidPayload(_) => StatusCode::BAD_GATEWAY,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ApiKeyNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Exemption(e) => e.code(),
            Self::BadRequest(_) => "invalid_argument",
            Self::ApiKeyNotConfigured => "api_key_not_configured",
            Self::InvalidApiKey => "invalid_api_key",
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable code.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
