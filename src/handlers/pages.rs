//! Gated HTML pages.
//!
//! Page routes redirect instead of returning 401: a browser landing on
//! `/` without a session is sent to `/login`, and a signed-in user
//! loading `/login` is sent back to the app.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::app_state::AppState;
use crate::session::session_from_headers;

/// GET /
pub async fn app_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // ---
    match session_from_headers(&headers, state.sessions()) {
        Some(session) => Html(format!(
            "<!DOCTYPE html>\n<html><body>\
             <h1>Todos</h1>\
             <p>Signed in as {}.</p>\
             <p>API: GET /api/me, GET /api/todos, GET /api/credentials</p>\
             </body></html>",
            session.username
        ))
        .into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

/// GET /login
pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // ---
    if session_from_headers(&headers, state.sessions()).is_some() {
        return Redirect::to("/").into_response();
    }
    Html(
        "<!DOCTYPE html>\n<html><body>\
         <h1>Sign in</h1>\
         <p>Register: POST /auth/register/start then /auth/register/finish</p>\
         <p>Sign in: POST /auth/login/start then /auth/login/finish</p>\
         </body></html>"
            .to_string(),
    )
    .into_response()
}
