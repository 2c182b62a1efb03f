//! Token credentials for the management API.
//!
//! A [`TokenCredential`] turns a scope into a bearer token. The binary builds
//! a [`ChainedTokenCredential`] from settings with [`from_settings`]: a
//! pre-issued token first, then the client-secret flow, then managed
//! identity. Tokens are fetched per request and never cached.

pub mod chained;
pub mod client_secret;
pub mod managed_identity;
pub mod static_token;

use std::sync::Arc;

use async_trait::async_trait;
use govapi_core::AccessToken;
use govapi_settings::IdentitySettings;
use serde::Deserialize;

use crate::errors::AuthError;

pub use chained::ChainedTokenCredential;
pub use client_secret::ClientSecretCredential;
pub use managed_identity::{ManagedIdentityCredential, ManagedIdentitySource};
pub use static_token::StaticTokenCredential;

/// Source of bearer tokens.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Short name used in logs and chain errors.
    fn name(&self) -> &'static str;

    /// Acquire a token for `scope` (e.g. `https://management.azure.com/.default`).
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError>;
}

/// Body of a token endpoint response. Only the token itself is used.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Read a token endpoint response, mapping non-2xx to [`AuthError::TokenEndpoint`].
async fn read_token_response(resp: reqwest::Response) -> Result<AccessToken, AuthError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    if !(200..300).contains(&status) {
        return Err(AuthError::TokenEndpoint {
            status,
            message: text,
        });
    }
    let data: TokenResponse = serde_json::from_str(&text)?;
    if data.access_token.is_empty() {
        return Err(AuthError::TokenEndpoint {
            status,
            message: "token endpoint returned an empty access_token".into(),
        });
    }
    Ok(AccessToken::new(data.access_token))
}

/// Build the credential chain described by `identity`.
///
/// `lookup` resolves hosting environment variables (`IDENTITY_ENDPOINT`,
/// `IDENTITY_HEADER`) for the managed identity source.
pub fn from_settings<F>(
    identity: &IdentitySettings,
    client: reqwest::Client,
    lookup: F,
) -> ChainedTokenCredential
where
    F: Fn(&str) -> Option<String>,
{
    let mut sources: Vec<Arc<dyn TokenCredential>> = Vec::new();

    if let Some(token) = identity.access_token.as_deref().filter(|t| !t.is_empty()) {
        sources.push(Arc::new(StaticTokenCredential::new(token)));
    }
    if let Some((tenant, client_id, secret)) = identity.client_secret_parts() {
        sources.push(Arc::new(ClientSecretCredential::new(
            client.clone(),
            &identity.authority_host,
            tenant,
            client_id,
            secret,
        )));
    }
    if identity.managed_identity {
        let source = ManagedIdentitySource::detect(lookup);
        sources.push(Arc::new(ManagedIdentityCredential::new(
            client,
            source,
            identity.managed_identity_client_id.clone(),
        )));
    }

    let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
    tracing::info!(?names, "credential chain configured");
    ChainedTokenCredential::new(sources)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
