//! `GovapiServer`: the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::middleware;
use axum::response::Json;
use axum::routing::{get, put};
use axum::Router;
use govapi_azure::TokenCredential;
use govapi_core::{Clock, ExemptionService};
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handlers::{exemptions, time};
use crate::health::{self, HealthResponse};
use crate::middleware::{ApiKeyGate, attach_token, require_api_key};
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Exemption pipeline.
    pub service: Arc<ExemptionService>,
    /// Time source for `/time`.
    pub clock: Arc<dyn Clock>,
    /// When the server started.
    pub start_time: Instant,
}

/// The policy exemption API server.
pub struct GovapiServer {
    config: ServerConfig,
    service: Arc<ExemptionService>,
    credential: Arc<dyn TokenCredential>,
    clock: Arc<dyn Clock>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl GovapiServer {
    /// Create a new server.
    pub fn new(
        config: ServerConfig,
        service: ExemptionService,
        credential: Arc<dyn TokenCredential>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            service: Arc::new(service),
            credential,
            clock,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes and gates.
    ///
    /// The API-key gate wraps everything; token acquisition wraps only the
    /// exemption routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            service: self.service.clone(),
            clock: self.clock.clone(),
            start_time: self.start_time,
        };
        let gate = Arc::new(ApiKeyGate::new(
            self.config.development,
            self.config.api_key.as_deref(),
        ));

        let exemption_routes = Router::new()
            .route(
                "/policyexemptions/{subscription_id}",
                get(exemptions::list_exemptions),
            )
            .route(
                "/policyexemptions/{subscription_id}/{exemption_name}",
                get(exemptions::get_exemption),
            )
            .route(
                "/policyexemptions/{subscription_id}/{exemption_name}/expiresOn",
                put(exemptions::update_expiry),
            )
            .route_layer(middleware::from_fn_with_state(
                self.credential.clone(),
                attach_token,
            ));

        Router::new()
            .route("/health", get(health_handler))
            .route("/time", get(time::current_time))
            .merge(exemption_routes)
            .layer(middleware::from_fn_with_state(gate, require_api_key))
            .layer(TimeoutLayer::new(self.config.request_timeout))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind the listener and serve until shutdown is requested.
    ///
    /// Returns the bound address (useful with port `0`) and the server task.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!(%local_addr, development = self.config.development, "govapi server started");

        let router = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                tracing::error!(error = %e, "server terminated with error");
            }
        });

        Ok((local_addr, handle))
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(state.start_time))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use govapi_azure::AuthError;
    use govapi_azure::credential::StaticTokenCredential;
    use govapi_core::{
        AccessToken, ExemptionError, FixedClock, HttpClient, HttpResponse, ManagementEndpoint,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// Replays canned responses and records the URLs and tokens it saw.
    #[derive(Default)]
    struct CannedHttp {
        responses: Mutex<VecDeque<(u16, Value)>>,
        seen: Mutex<Vec<(String, String, String)>>,
    }

    impl CannedHttp {
        fn with(responses: Vec<(u16, Value)>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::default(),
            })
        }

        fn next(&self, method: &str, url: &str, token: &AccessToken) -> Result<HttpResponse, ExemptionError> {
            self.seen
                .lock()
                .unwrap()
                .push((method.into(), url.into(), token.secret().into()));
            let (status, body) = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ExemptionError::Transport("no canned response".into()))?;
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            })
        }
    }

    #[async_trait]
    impl HttpClient for CannedHttp {
        async fn get(&self, url: &str, token: &AccessToken) -> Result<HttpResponse, ExemptionError> {
            self.next("GET", url, token)
        }

        async fn put_json(
            &self,
            url: &str,
            token: &AccessToken,
            _body: &Value,
        ) -> Result<HttpResponse, ExemptionError> {
            self.next("PUT", url, token)
        }
    }

    struct NoCredential;

    #[async_trait]
    impl TokenCredential for NoCredential {
        fn name(&self) -> &'static str {
            "none"
        }

        async fn get_token(&self, _scope: &str) -> Result<AccessToken, AuthError> {
            Err(AuthError::NotConfigured("test".into()))
        }
    }

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 1, 10, 8, 30, 0).unwrap()))
    }

    fn make_server(
        config: ServerConfig,
        http: Arc<CannedHttp>,
        credential: Arc<dyn TokenCredential>,
    ) -> GovapiServer {
        let clock = clock();
        let service = ExemptionService::new(
            http,
            ManagementEndpoint::new("https://mgmt.test", "2022-07-01-preview"),
            clock.clone(),
        );
        GovapiServer::new(config, service, credential, clock)
    }

    fn keyed() -> ServerConfig {
        ServerConfig {
            api_key: Some("k".into()),
            ..ServerConfig::default()
        }
    }

    fn static_token() -> Arc<dyn TokenCredential> {
        Arc::new(StaticTokenCredential::new("tok"))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-api-key", "k")
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    fn exemption(name: &str, assignment: &str) -> Value {
        json!({
            "id": format!("/subscriptions/s1/providers/Microsoft.Authorization/policyExemptions/{name}"),
            "name": name,
            "properties": {
                "policyAssignmentId": format!("/subscriptions/s1/providers/Microsoft.Authorization/policyAssignments/{assignment}"),
                "expiresOn": "2025-01-12T00:00:00Z"
            }
        })
    }

    // ── health & time ───────────────────────────────────────────────

    #[tokio::test]
    async fn health_needs_no_key() {
        let server = make_server(ServerConfig::default(), CannedHttp::with(vec![]), static_token());
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(server.router(), req).await;
        assert_eq!(status, StatusCode::OK);
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
    }

    #[tokio::test]
    async fn time_returns_iso8601_text() {
        let server = make_server(keyed(), CannedHttp::with(vec![]), static_token());
        let (status, body) = send(server.router(), get("/time")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(body).unwrap(), "2025-01-10T08:30:00Z");
    }

    // ── api key gate ────────────────────────────────────────────────

    #[tokio::test]
    async fn missing_key_is_401() {
        let server = make_server(keyed(), CannedHttp::with(vec![]), static_token());
        let req = Request::builder().uri("/time").body(Body::empty()).unwrap();
        let (status, body) = send(server.router(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["message"], "Unauthorized: Invalid or missing API key.");
    }

    #[tokio::test]
    async fn unconfigured_key_is_500() {
        let server = make_server(ServerConfig::default(), CannedHttp::with(vec![]), static_token());
        let (status, _) = send(server.router(), get("/time")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn development_skips_key() {
        let config = ServerConfig {
            development: true,
            ..ServerConfig::default()
        };
        let server = make_server(config, CannedHttp::with(vec![]), static_token());
        let req = Request::builder().uri("/time").body(Body::empty()).unwrap();
        let (status, _) = send(server.router(), req).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn rejected_key_never_reaches_upstream() {
        let http = CannedHttp::with(vec![(200, json!({"value": []}))]);
        let server = make_server(keyed(), http.clone(), static_token());
        let req = Request::builder()
            .uri("/policyexemptions/s1")
            .header("x-api-key", "wrong")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(server.router(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(http.seen.lock().unwrap().is_empty());
    }

    // ── exemptions ──────────────────────────────────────────────────

    #[tokio::test]
    async fn list_groups_by_assignment() {
        let http = CannedHttp::with(vec![(
            200,
            json!({"value": [exemption("exA", "assignB"), exemption("exC", "assignB")]}),
        )]);
        let server = make_server(keyed(), http.clone(), static_token());

        let (status, body) = send(server.router(), get("/policyexemptions/s1?withExpiryDateWithinDays=2")).await;
        assert_eq!(status, StatusCode::OK);
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            parsed,
            json!({"assignB": [
                {"name": "exA", "expiresOn": "2025-01-12T00:00:00Z"},
                {"name": "exC", "expiresOn": "2025-01-12T00:00:00Z"}
            ]})
        );
        let seen = http.seen.lock().unwrap();
        assert_eq!(seen[0].2, "tok");
    }

    #[tokio::test]
    async fn list_without_value_is_null() {
        let http = CannedHttp::with(vec![(200, json!({"nextLink": null}))]);
        let server = make_server(keyed(), http, static_token());
        let (status, body) = send(server.router(), get("/policyexemptions/s1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"null");
    }

    #[tokio::test]
    async fn list_bad_window_is_400() {
        let http = CannedHttp::with(vec![]);
        let server = make_server(keyed(), http, static_token());
        for uri in [
            "/policyexemptions/s1?withExpiryDateWithinDays=366",
            "/policyexemptions/s1?withExpiryDateWithinDays=-1",
            "/policyexemptions/s1?withExpiryDateWithinDays=soon",
            "/policyexemptions/s1?showAllProperties=perhaps",
        ] {
            let (status, body) = send(server.router(), get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            let parsed: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(parsed["error"], "invalid_argument");
        }
    }

    #[tokio::test]
    async fn failed_token_acquisition_is_401() {
        let http = CannedHttp::with(vec![]);
        let server = make_server(keyed(), http.clone(), Arc::new(NoCredential));
        let (status, body) = send(server.router(), get("/policyexemptions/s1")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"], "unauthorized");
        assert!(http.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_is_502() {
        let http = CannedHttp::with(vec![(500, json!({"error": "boom"}))]);
        let server = make_server(keyed(), http, static_token());
        let (status, _) = send(server.router(), get("/policyexemptions/s1")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn get_missing_exemption_is_404() {
        let http = CannedHttp::with(vec![(404, json!({}))]);
        let server = make_server(keyed(), http, static_token());
        let (status, body) = send(server.router(), get("/policyexemptions/s1/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"], "not_found");
    }

    #[tokio::test]
    async fn get_returns_raw_record() {
        let raw = exemption("ex1", "a1");
        let http = CannedHttp::with(vec![(200, raw.clone())]);
        let server = make_server(keyed(), http, static_token());
        let (status, body) = send(server.router(), get("/policyexemptions/s1/ex1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), raw);
    }

    #[tokio::test]
    async fn encoded_dot_segments_are_400() {
        let http = CannedHttp::with(vec![]);
        let server = make_server(keyed(), http.clone(), static_token());
        for uri in [
            "/policyexemptions/%2E%2E",
            "/policyexemptions/s1/%2E%2E",
            "/policyexemptions/%2e%2e/ex1",
        ] {
            let (status, body) = send(server.router(), get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            let parsed: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(parsed["error"], "invalid_argument");
        }

        let req = Request::builder()
            .method("PUT")
            .uri("/policyexemptions/s1/%2E%2E/expiresOn?expiresOnIso8601=2026-01-01T00:00:00Z")
            .header("x-api-key", "k")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(server.router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(http.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_expiry_round_trip() {
        let raw = exemption("ex1", "a1");
        let mut updated = raw.clone();
        updated["properties"]["expiresOn"] = json!("2026-06-30T00:00:00Z");
        let http = CannedHttp::with(vec![(200, raw), (200, updated.clone())]);
        let server = make_server(keyed(), http.clone(), static_token());

        let req = Request::builder()
            .method("PUT")
            .uri("/policyexemptions/s1/ex1/expiresOn?expiresOnIso8601=2026-06-30T00:00:00Z")
            .header("x-api-key", "k")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(server.router(), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), updated);
        let methods: Vec<String> = http.seen.lock().unwrap().iter().map(|s| s.0.clone()).collect();
        assert_eq!(methods, vec!["GET", "PUT"]);
    }

    #[tokio::test]
    async fn update_without_value_is_400() {
        let server = make_server(keyed(), CannedHttp::with(vec![]), static_token());
        let req = Request::builder()
            .method("PUT")
            .uri("/policyexemptions/s1/ex1/expiresOn")
            .header("x-api-key", "k")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(server.router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_rejected_is_500() {
        let http = CannedHttp::with(vec![(200, exemption("ex1", "a1")), (400, json!({"error": "bad date"}))]);
        let server = make_server(keyed(), http, static_token());
        let req = Request::builder()
            .method("PUT")
            .uri("/policyexemptions/s1/ex1/expiresOn?expiresOnIso8601=yesterday")
            .header("x-api-key", "k")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(server.router(), req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"], "update_failed");
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let server = make_server(keyed(), CannedHttp::with(vec![]), static_token());
        let (status, _) = send(server.router(), get("/nonexistent")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listen_and_shutdown() {
        let server = make_server(keyed(), CannedHttp::with(vec![]), static_token());
        let (addr, handle) = server.listen().await.unwrap();
        assert_ne!(addr.port(), 0);

        server
            .shutdown()
            .graceful_shutdown(handle, Some(std::time::Duration::from_secs(5)))
            .await;
        assert!(server.shutdown().is_shutting_down());
    }
}
