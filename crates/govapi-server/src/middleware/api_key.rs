//! Shared-key gate on the `x-api-key` header.
//!
//! Checks run in this order:
//! 1. Development environment → pass
//! 2. `/health` → pass
//! 3. No key configured → 500
//! 4. Header missing or different → 401
//!
//! Keys are compared as SHA-256 digests so the comparison time does not
//! depend on how much of the key matched.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// Header carrying the caller's key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Paths served without a key.
const OPEN_PATHS: &[&str] = &["/health"];

/// Gate configuration.
#[derive(Clone, Debug)]
pub struct ApiKeyGate {
    development: bool,
    expected: Option<[u8; 32]>,
}

impl ApiKeyGate {
    /// Gate for `api_key`. An empty key counts as not configured.
    pub fn new(development: bool, api_key: Option<&str>) -> Self {
        Self {
            development,
            expected: api_key.filter(|k| !k.is_empty()).map(digest),
        }
    }

    /// Decide whether a request for `path` carrying `presented` may proceed.
    pub fn check(&self, path: &str, presented: Option<&str>) -> Result<(), ApiError> {
        if self.development || OPEN_PATHS.contains(&path) {
            return Ok(());
        }
        let Some(expected) = self.expected else {
            return Err(ApiError::ApiKeyNotConfigured);
        };
        match presented {
            Some(key) if digest(key) == expected => Ok(()),
            _ => Err(ApiError::InvalidApiKey),
        }
    }
}

fn digest(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}

/// Axum middleware enforcing [`ApiKeyGate`].
pub async fn require_api_key(
    State(gate): State<Arc<ApiKeyGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    match gate.check(request.uri().path(), presented) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::warn!(path = request.uri().path(), code = e.code(), "api key check failed");
            e.into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
