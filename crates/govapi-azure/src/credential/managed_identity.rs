//! Managed identity tokens from the hosting platform.
//!
//! Two endpoints are supported:
//! - the App Service identity endpoint, advertised by `IDENTITY_ENDPOINT`
//!   and `IDENTITY_HEADER` (api-version `2019-08-01`)
//! - the instance metadata service otherwise (api-version `2018-02-01`)
//!
//! Both take a `resource` rather than a scope, so the `/.default` suffix is
//! stripped before the call.

use async_trait::async_trait;
use govapi_core::AccessToken;

use super::{TokenCredential, read_token_response};
use crate::errors::AuthError;

/// Instance metadata service token endpoint.
pub const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const IMDS_API_VERSION: &str = "2018-02-01";

/// Where managed identity tokens come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManagedIdentitySource {
    /// App Service / Functions identity endpoint.
    AppService {
        /// Value of `IDENTITY_ENDPOINT`.
        endpoint: String,
        /// Value of `IDENTITY_HEADER`, sent as `X-IDENTITY-HEADER`.
        header: String,
    },
    /// Instance metadata service.
    Imds {
        /// Token endpoint URL.
        endpoint: String,
    },
}

impl ManagedIdentitySource {
    /// Pick the source advertised by the hosting environment.
    pub fn detect<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        match (var("IDENTITY_ENDPOINT"), var("IDENTITY_HEADER")) {
            (Some(endpoint), Some(header)) => Self::AppService { endpoint, header },
            _ => Self::Imds {
                endpoint: IMDS_ENDPOINT.to_owned(),
            },
        }
    }
}

/// Token credential for a system- or user-assigned managed identity.
pub struct ManagedIdentityCredential {
    client: reqwest::Client,
    source: ManagedIdentitySource,
    client_id: Option<String>,
}

impl ManagedIdentityCredential {
    /// Credential for `source`. `client_id` selects a user-assigned identity.
    pub fn new(
        client: reqwest::Client,
        source: ManagedIdentitySource,
        client_id: Option<String>,
    ) -> Self {
        Self {
            client,
            source,
            client_id,
        }
    }

    /// Configured source.
    pub fn source(&self) -> &ManagedIdentitySource {
        &self.source
    }
}

/// `https://management.azure.com/.default` → `https://management.azure.com/`.
fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix(".default").unwrap_or(scope)
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    fn name(&self) -> &'static str {
        "managed-identity"
    }

    #[tracing::instrument(skip_all, fields(user_assigned = self.client_id.is_some()))]
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        let resource = scope_to_resource(scope);
        let mut query = vec![("resource", resource)];
        if let Some(id) = self.client_id.as_deref() {
            query.push(("client_id", id));
        }

        let request = match &self.source {
            ManagedIdentitySource::AppService { endpoint, header } => {
                query.push(("api-version", APP_SERVICE_API_VERSION));
                self.client
                    .get(endpoint)
                    .header("X-IDENTITY-HEADER", header)
                    .query(&query)
            }
            ManagedIdentitySource::Imds { endpoint } => {
                query.push(("api-version", IMDS_API_VERSION));
                self.client
                    .get(endpoint)
                    .header("Metadata", "true")
                    .query(&query)
            }
        };

        read_token_response(request.send().await?).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
