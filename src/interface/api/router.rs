//! API Router configuration

use super::health::health_check;
use super::metrics_handler::metrics_handler;
use super::ws_handler::ws_handler;
use super::AppState;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

/// Build the API router
pub fn build_router(state: AppState, prometheus_handle: PrometheusHandle) -> Router {
    let session_path = state.handler.path().to_string();

    // Health check route
    let health_routes = Router::new().route("/health", get(health_check));

    // Metrics route (separate state)
    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    // Runtime WebSocket route
    let session_routes = Router::new()
        .route(&session_path, get(ws_handler))
        .with_state(state);

    Router::new()
        .merge(health_routes)
        .merge(metrics_routes)
        .merge(session_routes)
        .layer(TraceLayer::new_for_http())
}
