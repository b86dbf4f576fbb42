//! Request middleware: the session gate for `/api` routes and HTTP
//! request instrumentation.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;
use crate::error::AuthError;
use crate::session::session_from_headers;

/// Reject requests without a valid session cookie with 401; on success,
/// the verified [`SessionInfo`] is inserted as a request extension for
/// handlers to read.
///
/// [`SessionInfo`]: crate::session::SessionInfo
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // ---
    match session_from_headers(request.headers(), state.sessions()) {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => AuthError::Unauthorized.into_response(),
    }
}

/// Record latency and status for every request that passes through.
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    // ---
    let start = Instant::now();
    let path = request.uri().path().to_owned();
    let method = request.method().to_string();
    let response = next.run(request).await;
    state
        .metrics()
        .record_http_request(start, &path, &method, response.status().as_u16());
    response
}
