//! Exemption pipeline error types.

use thiserror::Error;

/// Failures surfaced by [`crate::ExemptionService`].
///
/// The pipeline never retries. Every failure is returned to the boundary,
/// which maps it to a status code via [`ExemptionError::code`].
#[derive(Debug, Error)]
pub enum ExemptionError {
    /// A caller-supplied parameter failed validation.
    #[error("{0}")]
    InvalidArgument(String),

    /// No access token was available for the management API.
    #[error("no access token available for the management API")]
    Unauthorized,

    /// The management API answered with a non-success status.
    #[error("management API returned {status}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for logging.
        body: String,
    },

    /// A raw exemption record lacked its `id` property.
    #[error("malformed exemption record: {0}")]
    Malformed(String),

    /// The named exemption does not exist.
    #[error("policy exemption '{name}' not found")]
    NotFound {
        /// Exemption name that was requested.
        name: String,
    },

    /// The write phase of an expiry update was rejected.
    #[error("failed to update policy exemption ({status})")]
    UpdateFailed {
        /// HTTP status code of the PUT.
        status: u16,
        /// Response body, kept for logging.
        body: String,
    },

    /// The outbound request could not be completed (connect, timeout, body read).
    #[error("management API request failed: {0}")]
    Transport(String),

    /// The management API returned a success status with a non-JSON body.
    #[error("management API returned an unreadable body: {0}")]
    InvalidPayload(String),
}

impl ExemptionError {
    /// Build an [`ExemptionError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Unauthorized => "unauthorized",
            Self::Upstream { .. } => "upstream_error",
            Self::Malformed(_) => "malformed_record",
            Self::NotFound { .. } => "not_found",
            Self::UpdateFailed { .. } => "update_failed",
            Self::Transport(_) => "transport_error",
            Self::InvalidPayload(_) => "invalid_payload",
        }
    }
}

impl From<serde_json::Error> for ExemptionError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
