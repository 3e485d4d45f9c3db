//! Operational HTTP endpoints (uninstrumented).
//!
//! - `/health`  : liveness
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use agrifood_core::metrics::TEXT_CONTENT_TYPE;

use crate::app_state::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.registry().export_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics export failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.client_code().as_str() })),
            )
                .into_response()
        }
    }
}
