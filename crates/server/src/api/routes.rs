use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::middleware::{auth_middleware, metrics_middleware};
use super::{handlers, video};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Routes that require an authenticated caller
    let protected = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/video/process", post(video::process_video))
        .route("/video/pool", get(video::get_pool))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/video/status", get(video::get_status))
        .merge(protected);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
