//! Health check endpoint.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;

use crate::routes::{Params, send_json};
use crate::state::AppState;

/// Response for GET /health.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    running: bool,
}

/// Handle GET /health.
#[allow(clippy::unused_async)]
pub(crate) async fn get_health(state: Arc<AppState>, _params: Params) -> Response {
    let body = HealthResponse {
        status: "ok",
        running: state.is_running(),
    };
    send_json(&body, StatusCode::OK)
}
