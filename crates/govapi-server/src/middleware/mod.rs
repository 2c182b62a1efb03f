//! Request gates applied before the handlers run.

pub mod api_key;
pub mod token;

pub use api_key::{API_KEY_HEADER, ApiKeyGate, require_api_key};
pub use token::{RequestToken, attach_token};
