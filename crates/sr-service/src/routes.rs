//! HTTP routes for the signaling relay.
//!
//! Defines the Axum router and application state.

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;
use crate::handlers;
use crate::registry::RegistryHandle;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Handle to the registry actor.
    pub registry: RegistryHandle,
}

/// Build the application routes.
///
/// - `/health` - liveness probe (simple "OK")
/// - `/ready` - readiness probe (registry round-trip)
/// - `/metrics` - Prometheus metrics endpoint
/// - `/ws` - the signaling WebSocket
/// - `/api/v1/token` - issue an access token
/// - `/api/v1/token/validate` - validate an access token
///
/// The request timeout is not applied to `/ws`: a signaling connection
/// is expected to outlive any sane HTTP timeout.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let http_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/v1/token", post(handlers::issue_token_handler))
        .route(
            "/api/v1/token/validate",
            post(handlers::validate_token_handler),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state.clone());

    let ws_routes = Router::new()
        .route("/ws", get(handlers::ws_handler))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    http_routes
        .merge(ws_routes)
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
}
