//! Management API client using `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use govapi_core::{AccessToken, ExemptionError, HttpClient, HttpResponse};
use serde_json::Value;

/// Default timeout for one outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client backed by `reqwest`.
///
/// One instance is shared by every request; `reqwest::Client` pools
/// connections internally.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client with a per-call timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(concat!("govapi/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
        }
    }

    /// The underlying `reqwest` client, for sharing with token credentials.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<HttpResponse, ExemptionError> {
        let response = request
            .send()
            .await
            .map_err(|e| ExemptionError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ExemptionError::Transport(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, token: &AccessToken) -> Result<HttpResponse, ExemptionError> {
        tracing::debug!(url, "GET");
        self.send(self.client.get(url).bearer_auth(token.secret()))
            .await
    }

    async fn put_json(
        &self,
        url: &str,
        token: &AccessToken,
        body: &Value,
    ) -> Result<HttpResponse, ExemptionError> {
        tracing::debug!(url, "PUT");
        self.send(self.client.put(url).bearer_auth(token.secret()).json(body))
            .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
