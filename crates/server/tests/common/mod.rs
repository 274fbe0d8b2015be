//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock object store and toolchain injected, so the full HTTP stack
//! can be exercised without ffmpeg or real storage.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use hlsmith_core::{
    create_authenticator, AuthConfig, AuthMethod, Authenticator, Config, OrchestratorConfig,
    ServerConfig, TranscodeOrchestrator,
    testing::{MockObjectStore, MockToolchain},
};
use hlsmith_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use hlsmith_core::testing::fixtures;

pub const ADMIN_KEY: &str = "admin-secret";
pub const VIEWER_KEY: &str = "viewer-secret";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_process() {
///     let fixture = TestFixture::new().await;
///     fixture.store.insert("uploads/a.mp4", b"...".to_vec()).await;
///
///     let response = fixture.post("/api/v1/video/process", json!({
///         "videoKey": "uploads/a.mp4"
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock object store - seed sources, inspect outputs
    pub store: Arc<MockObjectStore>,
    /// Mock toolchain - control probe and encode behavior
    pub toolchain: Arc<MockToolchain>,
    /// Scratch space for engine runs
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Use API key auth with `ADMIN_KEY` and `VIEWER_KEY`
    pub api_key_auth: bool,
    pub orchestrator: OrchestratorConfig,
}

impl TestConfig {
    /// Create config with API key authentication.
    pub fn with_api_key() -> Self {
        Self {
            api_key_auth: true,
            ..Default::default()
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let store = Arc::new(MockObjectStore::new());
        let toolchain = Arc::new(MockToolchain::new());

        let auth = if test_config.api_key_auth {
            AuthConfig {
                method: AuthMethod::ApiKey,
                api_key: Some(ADMIN_KEY.to_string()),
                viewer_keys: vec![VIEWER_KEY.to_string()],
            }
        } else {
            AuthConfig {
                method: AuthMethod::None,
                api_key: None,
                viewer_keys: Vec::new(),
            }
        };

        let transcode = fixtures::transcode_config(temp_dir.path())
            .with_renditions(fixtures::small_ladder());

        let config = Config {
            auth,
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            storage: Default::default(),
            transcode: transcode.clone(),
            orchestrator: test_config.orchestrator.clone(),
            progress: Default::default(),
        };

        let authenticator: Arc<dyn Authenticator> = Arc::from(
            create_authenticator(&config.auth).expect("Failed to create authenticator"),
        );

        let engine = fixtures::engine(transcode, store.clone(), toolchain.clone());
        let orchestrator = Arc::new(TranscodeOrchestrator::new(
            test_config.orchestrator,
            engine,
        ));

        let state = Arc::new(AppState::new(config, authenticator, orchestrator));
        let router = create_router(state);

        Self {
            router,
            store,
            toolchain,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Send a GET request with an API key.
    pub async fn get_with_key(&self, path: &str, key: &str) -> TestResponse {
        self.request("GET", path, None, Some(key)).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), None).await
    }

    /// Send a POST request with JSON body and an API key.
    pub async fn post_with_key(&self, path: &str, body: Value, key: &str) -> TestResponse {
        self.request("POST", path, Some(body), Some(key)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Get the raw text body of a GET request.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Poll the status endpoint until the job is done or failed.
    pub async fn wait_for_terminal(&self, video_key: &str) -> Value {
        let path = format!(
            "/api/v1/video/status?videoKey={}",
            urlencoding::encode(video_key)
        );
        for _ in 0..500 {
            let response = self.get(&path).await;
            let status = response.body["state"]["status"].as_str().unwrap_or_default();
            if status == "done" || status == "failed" {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {}", video_key);
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        api_key: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(key) = api_key {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", key));
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
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

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
