use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::app_state::AppState;

/// GET /metrics
///
/// Prometheus text exposition of the configured metrics backend. With the
/// no-op backend the body is empty, which scrapers treat as "no samples".
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics().render(),
    )
}
