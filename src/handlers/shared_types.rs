use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Envelope for successful API payloads: `{ "data": ... }`.
///
/// Keeps the success shape distinct from the error shape produced by
/// `AuthError` (`{ "error": ... }`), so clients can branch on the key.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}
