//! Store liveness probe.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use super::{detail, AppState};

pub async fn health(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => {
            crate::metrics::health_check(true);
            Json(serde_json::json!({ "status": "ok", "database": "reachable" })).into_response()
        }
        Err(e) => {
            crate::metrics::health_check(false);
            tracing::error!(error = %e, "Healthcheck failed. Database not reachable");
            detail(StatusCode::INTERNAL_SERVER_ERROR, "Database not reachable")
        }
    }
}
