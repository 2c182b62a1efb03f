//! # govapi
//!
//! Policy exemption API server binary: loads settings, builds the credential
//! chain and management client, and serves until ctrl-c.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use govapi_azure::{ReqwestHttpClient, TokenCredential, credential};
use govapi_core::logging::{LogFormat, init_subscriber};
use govapi_core::{ExemptionService, ManagementEndpoint, SystemClock};
use govapi_server::{GovapiServer, ServerConfig};
use govapi_settings::GovapiSettings;

/// Policy exemption API server.
#[derive(Parser, Debug)]
#[command(name = "govapi", version, about = "Policy exemption API server")]
struct Cli {
    /// Settings file (defaults to `$GOVAPI_CONFIG` or `./govapi.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,
}

impl Cli {
    fn settings_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(govapi_settings::settings_path)
    }
}

/// Load settings and apply command-line overrides.
fn load_settings(args: &Cli) -> Result<GovapiSettings> {
    let path = args.settings_path();
    let mut settings = govapi_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    if let Some(host) = &args.host {
        settings.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    Ok(settings)
}

/// Wire the HTTP client, credential chain and pipeline into a server.
fn build_server(settings: &GovapiSettings) -> GovapiServer {
    let http = ReqwestHttpClient::with_timeout(Duration::from_secs(
        settings.server.request_timeout_secs,
    ));
    let credential: Arc<dyn TokenCredential> = Arc::new(credential::from_settings(
        &settings.identity,
        http.inner().clone(),
        |name| std::env::var(name).ok(),
    ));
    let clock = Arc::new(SystemClock);
    let service = ExemptionService::new(
        Arc::new(http),
        ManagementEndpoint::new(
            settings.management.endpoint.as_str(),
            settings.management.api_version.as_str(),
        ),
        clock.clone(),
    );
    GovapiServer::new(ServerConfig::from_settings(settings), service, credential, clock)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = load_settings(&args)?;

    let format = if settings.logging.json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    init_subscriber(&settings.logging.level, format);

    if settings.server.is_development() {
        tracing::warn!("development environment: API key check disabled");
    } else if settings.security.api_key.is_none() {
        tracing::warn!("no API key configured: every gated request will fail with 500");
    }

    let server = build_server(&settings);
    let (addr, handle) = server
        .listen()
        .await
        .context("Failed to bind server")?;

    tracing::info!(
        management = %settings.management.endpoint,
        "govapi listening on http://{addr}"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown().graceful_shutdown(handle, None).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
