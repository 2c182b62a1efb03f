//! OAuth2 client-credentials grant.

use async_trait::async_trait;
use govapi_core::AccessToken;

use super::{TokenCredential, read_token_response};
use crate::errors::AuthError;

/// Application identity authenticated with a client secret.
pub struct ClientSecretCredential {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientSecretCredential {
    /// Credential posting to `{authority_host}/{tenant_id}/oauth2/v2.0/token`.
    pub fn new(
        client: reqwest::Client,
        authority_host: &str,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Self {
        Self {
            client,
            token_url: format!(
                "{}/{tenant_id}/oauth2/v2.0/token",
                authority_host.trim_end_matches('/')
            ),
            client_id: client_id.to_owned(),
            client_secret: client_secret.to_owned(),
        }
    }

    /// Token endpoint URL.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    fn name(&self) -> &'static str {
        "client-secret"
    }

    #[tracing::instrument(skip_all, fields(client_id = %self.client_id))]
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope),
        ];
        let resp = self.client.post(&self.token_url).form(&form).send().await?;
        read_token_response(resp).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
