//! # govapi-azure
//!
//! Azure-facing plumbing for the policy exemption API:
//!
//! - [`ReqwestHttpClient`]: pooled bearer-authenticated client for the management API
//! - [`credential`]: token credentials (static, client secret, managed identity) and
//!   the chain that tries them in order
//! - [`AuthError`]: token acquisition failures

#![deny(unsafe_code)]

pub mod credential;
pub mod errors;
pub mod http;

pub use credential::{ChainedTokenCredential, TokenCredential};
pub use errors::AuthError;
pub use http::ReqwestHttpClient;
