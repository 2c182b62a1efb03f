//! Outbound HTTP capability used by the pipeline.
//!
//! The pipeline never builds its own client; it is handed an
//! `Arc<dyn HttpClient>` that pools connections and is shared by all
//! in-flight requests.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ExemptionError;

/// Bearer token for the management API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Whether the token string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Response from a management API call.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, ExemptionError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Authenticated JSON calls against the management API.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// `GET url` with a bearer token.
    async fn get(&self, url: &str, token: &AccessToken) -> Result<HttpResponse, ExemptionError>;

    /// `PUT url` with a bearer token and a JSON body.
    async fn put_json(
        &self,
        url: &str,
        token: &AccessToken,
        body: &Value,
    ) -> Result<HttpResponse, ExemptionError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
