//! HTTP routes — result upload, health check, metrics.

pub mod health;
pub mod upload;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::store::ResultStore;

/// Shared state for route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResultStore>,
    pub metrics: Option<PrometheusHandle>,
}

/// Build the service router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/upload-test-results/", post(upload::upload_test_results))
        .route("/health", get(health::health))
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `{"detail": ...}` body used by every non-health response.
pub(crate) fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "detail": message.into() }))).into_response()
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
