//! Ordered fallback across credentials.

use std::sync::Arc;

use async_trait::async_trait;
use govapi_core::AccessToken;
use tracing::debug;

use super::TokenCredential;
use crate::errors::AuthError;

/// Tries each credential in order and returns the first token.
#[derive(Clone, Default)]
pub struct ChainedTokenCredential {
    sources: Vec<Arc<dyn TokenCredential>>,
}

impl ChainedTokenCredential {
    /// Chain over `sources`, tried front to back.
    pub fn new(sources: Vec<Arc<dyn TokenCredential>>) -> Self {
        Self { sources }
    }

    /// Names of the chained credentials, in order.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl TokenCredential for ChainedTokenCredential {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        let mut failures = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            match source.get_token(scope).await {
                Ok(token) => {
                    debug!(source = source.name(), "token acquired");
                    return Ok(token);
                }
                Err(e) => {
                    debug!(source = source.name(), error = %e, "credential failed, trying next");
                    failures.push(format!("{}: {e}", source.name()));
                }
            }
        }
        Err(AuthError::ChainExhausted(failures))
    }
}
