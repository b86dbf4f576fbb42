use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct HealthQuery {
    mode: Option<String>,
}

/// GET /health
///
/// Light by default: answers 200 as long as the server is up. With
/// `?mode=full` it additionally pings the credential registry backend,
/// answering 500 with `{ "status": "error" }` if the ping fails.
pub async fn health_check(
    State(state): State<AppState>,
    Query(params): Query<HealthQuery>,
) -> (StatusCode, Json<HealthResponse>) {
    // ---
    if params.mode.as_deref() == Some("full") {
        if let Err(e) = state.registry().ping().await {
            tracing::warn!("registry ping failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse { status: "error" }),
            );
        }
    }
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}
