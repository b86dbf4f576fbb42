//! Public error taxonomy for the authentication subsystem.
//!
//! Every handler returns a disjoint success/failure result; this module maps
//! failures to a status code and a JSON `{"error": ...}` body. Internal
//! detail is logged server-side and never sent to the client.

use crate::domain::RegistryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    // ---
    /// Username outside [3,30] chars or containing disallowed characters.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("username already registered")]
    DuplicateUsername,

    #[error("credential already registered")]
    DuplicateCredential,

    /// No such user, or the user has no registered authenticators.
    #[error("unknown user")]
    UnknownUser,

    /// The asserted credential ID matches no registered authenticator.
    /// Always an exact-byte lookup miss; there is no fuzzy fallback.
    #[error("unknown credential")]
    AuthenticatorNotFound,

    /// No pending ceremony for the subject (never issued, already
    /// consumed, or overwritten by a newer options call).
    #[error("no pending ceremony")]
    ChallengeMissing,

    #[error("ceremony expired")]
    ChallengeExpired,

    /// The pending ceremony was issued for the other purpose.
    #[error("ceremony purpose mismatch")]
    PurposeMismatch,

    /// Signature, origin, RP ID or nonce mismatch in the ceremony response.
    #[error("verification failed")]
    VerificationFailed,

    /// Counter did not advance: the response is a replay or the
    /// authenticator was cloned. No session is issued.
    #[error("replay suspected")]
    ReplaySuspected,

    #[error("not authenticated")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    // ---
    pub fn status(&self) -> StatusCode {
        // ---
        match self {
            AuthError::InvalidUsername(_)
            | AuthError::ChallengeMissing
            | AuthError::ChallengeExpired
            | AuthError::PurposeMismatch
            | AuthError::VerificationFailed
            | AuthError::ReplaySuspected => StatusCode::BAD_REQUEST,
            AuthError::DuplicateUsername | AuthError::DuplicateCredential => StatusCode::CONFLICT,
            AuthError::UnknownUser | AuthError::AuthenticatorNotFound => StatusCode::NOT_FOUND,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RegistryError> for AuthError {
    // ---
    fn from(err: RegistryError) -> Self {
        // ---
        match err {
            RegistryError::DuplicateUsername => AuthError::DuplicateUsername,
            RegistryError::DuplicateCredential => AuthError::DuplicateCredential,
            RegistryError::NotFound => AuthError::AuthenticatorNotFound,
            RegistryError::CounterRegression => AuthError::ReplaySuspected,
            RegistryError::Backend(e) => AuthError::Internal(e),
        }
    }
}

impl IntoResponse for AuthError {
    // ---
    fn into_response(self) -> Response {
        // ---
        let message = match &self {
            AuthError::Internal(e) => {
                // Log the real cause, return a generic body.
                tracing::error!("internal error: {e:?}");
                "internal error".to_string()
            }
            AuthError::ReplaySuspected => {
                tracing::warn!("rejected authentication: counter regression");
                self.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message }));
        (self.status(), body).into_response()
    }
}
