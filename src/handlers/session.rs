//! Session lifecycle handlers.

use axum::{extract::State, http::header, response::AppendHeaders, Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::session::SessionInfo;

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    // ---
    pub success: bool,
}

/// POST /auth/logout
///
/// Sessions are stateless signed tokens, so there is nothing to revoke
/// server-side; logout clears the cookie (Max-Age=0) and the token ages
/// out on its own.
pub async fn logout(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    // ---
    let cookie = state.sessions().clear_cookie();
    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(LogoutResponse { success: true }),
    )
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    // ---
    pub user_id: Uuid,
    pub username: String,
}

/// GET /api/me
///
/// Identity of the current session, as verified by the session gate.
pub async fn me(Extension(session): Extension<SessionInfo>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: session.user_id,
        username: session.username,
    })
}
