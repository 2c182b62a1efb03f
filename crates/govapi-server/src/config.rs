//! Server configuration.

use std::time::Duration;

use govapi_settings::GovapiSettings;

/// Configuration for the HTTP server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Development mode disables the API-key gate.
    pub development: bool,
    /// Key expected in `x-api-key`.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// Derive server configuration from loaded settings.
    pub fn from_settings(settings: &GovapiSettings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            development: settings.server.is_development(),
            api_key: settings.security.api_key.clone(),
            request_timeout: Duration::from_secs(settings.server.request_timeout_secs),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            development: false,
            api_key: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}
