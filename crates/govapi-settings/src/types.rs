//! Settings types.
//!
//! Every struct deserializes with `#[serde(default)]`, so a settings file
//! only needs the keys it changes.

use std::fmt;

use govapi_core::constants::{DEFAULT_MANAGEMENT_ENDPOINT, EXEMPTIONS_API_VERSION};
use serde::{Deserialize, Serialize};

/// Root settings for the policy exemption API.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GovapiSettings {
    /// HTTP listener settings.
    pub server: ServerSettings,
    /// Management API location.
    pub management: ManagementSettings,
    /// Identity sources for acquiring management tokens.
    pub identity: IdentitySettings,
    /// Inbound request authentication.
    pub security: SecuritySettings,
    /// Log output.
    pub logging: LoggingSettings,
}

/// HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Hosting environment name. `Development` disables the API-key gate.
    pub environment: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ServerSettings {
    /// Whether the environment is `Development` (case-insensitive).
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: "Production".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Management API location.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagementSettings {
    /// Base URL of the management API.
    pub endpoint: String,
    /// `api-version` for policy exemption calls.
    pub api_version: String,
}

impl Default for ManagementSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MANAGEMENT_ENDPOINT.to_string(),
            api_version: EXEMPTIONS_API_VERSION.to_string(),
        }
    }
}

/// Identity sources. Unset fields disable the corresponding source.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentitySettings {
    /// Directory tenant for the client-secret flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Application (client) id for the client-secret flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Client secret for the client-secret flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Authority host for the token endpoint.
    pub authority_host: String,
    /// Client id of a user-assigned managed identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_identity_client_id: Option<String>,
    /// Whether managed identity is tried as the last source.
    pub managed_identity: bool,
    /// Pre-issued bearer token, tried first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl IdentitySettings {
    /// Tenant, client id and secret, when all three are set.
    pub fn client_secret_parts(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.tenant_id.as_deref()?,
            self.client_id.as_deref()?,
            self.client_secret.as_deref()?,
        ))
    }
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            client_secret: None,
            authority_host: "https://login.microsoftonline.com".to_string(),
            managed_identity_client_id: None,
            managed_identity: true,
            access_token: None,
        }
    }
}

impl fmt::Debug for IdentitySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentitySettings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("authority_host", &self.authority_host)
            .field("managed_identity_client_id", &self.managed_identity_client_id)
            .field("managed_identity", &self.managed_identity)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Inbound request authentication.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecuritySettings {
    /// Shared key expected in the `x-api-key` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl fmt::Debug for SecuritySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecuritySettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Log output.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive (`RUST_LOG` wins when set).
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
