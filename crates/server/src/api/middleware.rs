//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use hlsmith_core::{AuthError, AuthRequest, Identity};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use super::error::ApiError;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// This middleware records:
/// - Request duration (histogram)
/// - Request count (counter)
/// - Requests in flight (gauge)
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Authentication middleware that validates requests using the configured authenticator.
///
/// On success the caller's [`Identity`] is stored in the request extensions.
/// With the `none` method every caller is the local administrator.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let authenticator = state.authenticator();

    if authenticator.method_name() == "none" {
        request.extensions_mut().insert(Identity::local_admin());
        return Ok(next.run(request).await);
    }

    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    let source_ip = request
        .extensions()
        .get::<std::net::SocketAddr>()
        .map(|addr| addr.ip())
        .unwrap_or_else(|| std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST));

    let auth_request = AuthRequest { headers, source_ip };

    match authenticator.authenticate(&auth_request).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(err) => {
            let reason = match err {
                AuthError::NotAuthenticated => "not_authenticated",
                AuthError::InvalidCredentials(_) => "invalid_credentials",
                AuthError::Forbidden { .. } => "forbidden",
                _ => "internal_error",
            };
            AUTH_FAILURES_TOTAL.with_label_values(&[reason]).inc();
            if reason == "internal_error" {
                warn!(error = %err, "Authenticator failed");
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use hlsmith_core::{
        testing::{fixtures, MockObjectStore, MockToolchain},
        ApiKeyAuthenticator, AuthConfig, AuthMethod, Authenticator, Config, NoneAuthenticator,
        OrchestratorConfig, TranscodeOrchestrator,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn whoami(Extension(identity): Extension<Identity>) -> String {
        format!("{}:{}", identity.user_id, identity.is_admin())
    }

    fn create_test_state(auth: AuthConfig) -> Arc<AppState> {
        let authenticator: Arc<dyn Authenticator> = match auth.method {
            AuthMethod::None => Arc::new(NoneAuthenticator::new()),
            AuthMethod::ApiKey => Arc::new(
                ApiKeyAuthenticator::new(auth.api_key.clone().unwrap())
                    .with_viewer_keys(auth.viewer_keys.clone()),
            ),
        };

        let engine = fixtures::engine(
            fixtures::transcode_config(&std::env::temp_dir().join("hlsmith-middleware-tests")),
            Arc::new(MockObjectStore::new()),
            Arc::new(MockToolchain::new()),
        );
        let orchestrator = TranscodeOrchestrator::new(OrchestratorConfig::default(), engine);

        let config = Config {
            auth,
            server: Default::default(),
            storage: Default::default(),
            transcode: Default::default(),
            orchestrator: Default::default(),
            progress: Default::default(),
        };

        Arc::new(AppState::new(config, authenticator, Arc::new(orchestrator)))
    }

    fn api_key_auth() -> AuthConfig {
        AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: Some("secret-key".to_string()),
            viewer_keys: vec!["viewer-key".to_string()],
        }
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/test", get(whoami))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_none_auth_is_local_admin() {
        let state = create_test_state(AuthConfig {
            method: AuthMethod::None,
            api_key: None,
            viewer_keys: Vec::new(),
        });

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let (status, body) = send(app(state), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "local_admin:true");
    }

    #[tokio::test]
    async fn test_api_key_auth_valid() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer secret-key")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(create_test_state(api_key_auth())), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "api_key_admin:true");
    }

    #[tokio::test]
    async fn test_viewer_key_is_not_admin() {
        let request = Request::builder()
            .uri("/test")
            .header("X-API-Key", "viewer-key")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(create_test_state(api_key_auth())), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "api_key_viewer_0:false");
    }

    #[tokio::test]
    async fn test_api_key_auth_invalid() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer wrong-key")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(create_test_state(api_key_auth())), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_api_key_auth_missing() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let (status, _) = send(app(create_test_state(api_key_auth())), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
