use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{acquisitions, handlers, middleware::metrics_middleware, queue};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Acquisitions
        .route("/acquisitions", post(acquisitions::create_acquisition))
        // Queues and backends
        .route("/queue/{backend}", get(queue::get_queue))
        .route("/backends/{backend}/status", get(queue::get_backend_status))
        .route_layer(middleware::from_fn(metrics_middleware))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
}
