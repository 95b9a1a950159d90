//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock backends injected, so every route can be exercised without a
//! running catalog or peer backend.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use encore_core::testing::{MockCatalogApi, MockPeerApi};
use encore_core::{AcquisitionConfig, AcquisitionService, BackendConfig, Config};
use encore_server::api::create_router;
use encore_server::state::AppState;

/// Re-export fixtures for test convenience
pub use encore_core::testing::fixtures;

/// Which mock backends the fixture wires in.
#[derive(Debug, Clone, Copy)]
pub struct TestConfig {
    pub with_catalog: bool,
    pub with_peer: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            with_catalog: true,
            with_peer: true,
        }
    }
}

/// In-process router backed by mock backends.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_peer_acquisition() {
///     let fixture = TestFixture::new();
///     fixture.peer.set_responses(vec![fixtures::peer_response("alice", true, "X", 3)]).await;
///
///     let response = fixture.post("/api/v1/acquisitions", json!({
///         "backend": "peer", "album_title": "HEY WHAT", "artist_name": "Low"
///     })).await;
///
///     assert_eq!(response.body["success"], true);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    pub catalog: Arc<MockCatalogApi>,
    pub peer: Arc<MockPeerApi>,
    pub shutdown: CancellationToken,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(test_config: TestConfig) -> Self {
        let catalog = Arc::new(MockCatalogApi::new());
        let peer = Arc::new(MockPeerApi::new());

        let mut config = Config::default();
        let mut service = AcquisitionService::new(&AcquisitionConfig::default());
        if test_config.with_catalog {
            config.catalog = Some(BackendConfig::new("http://lidarr.test:8686", "catalog-secret"));
            service = service.with_catalog(catalog.clone());
        }
        if test_config.with_peer {
            config.peer = Some(BackendConfig::new("http://slskd.test:5030", "peer-secret"));
            service = service.with_peer(peer.clone());
        }

        let shutdown = CancellationToken::new();
        let state = Arc::new(AppState::new(config, service, shutdown.clone()));
        let router = create_router(state);

        Self {
            router,
            catalog,
            peer,
            shutdown,
        }
    }

    /// Send a GET request to the test router.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body.to_string())).await
    }

    /// Send a POST request with a raw body (for malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request("POST", path, Some(body.to_string())).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<String>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        let body = match body {
            Some(body) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(body)
            }
            None => Body::empty(),
        };
        let request = builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
