//! Per-request management token acquisition.
//!
//! Runs in front of the exemption routes only. A token is requested for the
//! management scope and stored in the request extensions as a
//! [`RequestToken`]. Acquisition failures are logged and stored as
//! `RequestToken(None)`; the pipeline turns that into `Unauthorized`.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use govapi_azure::TokenCredential;
use govapi_core::AccessToken;
use govapi_core::constants::MANAGEMENT_SCOPE;

/// Token attached to the current request, if one could be acquired.
#[derive(Clone, Debug, Default)]
pub struct RequestToken(pub Option<AccessToken>);

impl RequestToken {
    /// Borrow the token.
    pub fn get(&self) -> Option<&AccessToken> {
        self.0.as_ref()
    }
}

/// Axum middleware that acquires a token and attaches it to the request.
pub async fn attach_token(
    State(credential): State<Arc<dyn TokenCredential>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match credential.get_token(MANAGEMENT_SCOPE).await {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::error!(source = credential.name(), error = %e, "failed to acquire management token");
            None
        }
    };
    let _ = request.extensions_mut().insert(RequestToken(token));
    next.run(request).await
}
