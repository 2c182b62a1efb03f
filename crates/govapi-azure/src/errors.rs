//! Auth error types.

/// Errors that can occur while acquiring a management token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The token endpoint answered with a non-success status.
    #[error("token endpoint error ({status}): {message}")]
    TokenEndpoint {
        /// HTTP status code.
        status: u16,
        /// Response body or error description.
        message: String,
    },

    /// The credential source is not available in this environment.
    #[error("credential not configured: {0}")]
    NotConfigured(String),

    /// Every credential in a chain failed.
    #[error("no credential produced a token: [{}]", .0.join("; "))]
    ChainExhausted(Vec<String>),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
