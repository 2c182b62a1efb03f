//! Pre-issued bearer token.

use async_trait::async_trait;
use govapi_core::AccessToken;

use super::TokenCredential;
use crate::errors::AuthError;

/// Returns the same token for every scope. Meant for local development.
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn get_token(&self, _scope: &str) -> Result<AccessToken, AuthError> {
        if self.token.is_empty() {
            return Err(AuthError::NotConfigured("static token is empty".into()));
        }
        Ok(self.token.clone())
    }
}
