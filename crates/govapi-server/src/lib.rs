//! # govapi-server
//!
//! Axum HTTP surface for the policy exemption API.
//!
//! - **Routes**: `/policyexemptions/...`, `/time`, `/health`
//! - **Gates**: `x-api-key` check on every route except `/health`; per-request
//!   management token acquisition on the exemption routes
//! - **Errors**: [`ApiError`] maps pipeline failures to status codes with a JSON body
//! - **Lifecycle**: [`GovapiServer::listen`] plus [`ShutdownCoordinator`] for graceful stop

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod query;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use error::ApiError;
pub use server::{AppState, GovapiServer};
pub use shutdown::ShutdownCoordinator;
