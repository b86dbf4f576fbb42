//! Passkey registration handlers.
//!
//! Implements the two-phase registration ceremony:
//! 1. `register_start` - Validate the username, generate a challenge and
//!    return credential creation options
//! 2. `register_finish` - Verify the authenticator response, then create
//!    the user and their first credential in one step

use axum::{extract::State, http::header, response::AppendHeaders, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use webauthn_rs::prelude::RegisterPublicKeyCredential;

use crate::app_state::AppState;
use crate::domain::{Authenticator, CeremonyPurpose, PendingCeremony, User};
use crate::error::AuthError;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegistrationStartRequest {
    // ---
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct RegistrationStartResponse {
    // ---
    /// WebAuthn credential creation options, passed by the client to
    /// `navigator.credentials.create()`.
    pub challenge: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationFinishRequest {
    // ---
    pub username: String,
    pub credential: RegisterPublicKeyCredential,
}

#[derive(Debug, Serialize)]
pub struct RegistrationFinishResponse {
    // ---
    pub user_id: Uuid,
    pub username: String,
    /// Hex-encoded credential ID of the newly registered passkey.
    pub credential_id: String,
}

// ============================================================================
// Registration Start Handler
// ============================================================================

/// POST /auth/register/start
///
/// Initiates passkey registration. The username must be 3-30 characters
/// of letters, digits or underscore and must not already be taken. No
/// user record is created here; the reserved user ID travels with the
/// pending ceremony and only becomes a row when the ceremony completes.
pub async fn register_start(
    State(state): State<AppState>,
    Json(req): Json<RegistrationStartRequest>,
) -> Result<Json<RegistrationStartResponse>, AuthError> {
    // ---
    super::validate_username(&req.username)?;

    if state
        .registry()
        .find_user_by_username(&req.username)
        .await?
        .is_some()
    {
        return Err(AuthError::DuplicateUsername);
    }

    let user_id = Uuid::new_v4();
    let (challenge, ceremony_state) =
        state
            .verifier()
            .registration_options(user_id, &req.username, vec![])?;

    // Replaces any pending ceremony for this username, invalidating it.
    let ceremony = PendingCeremony::new(
        CeremonyPurpose::Registration,
        user_id,
        ceremony_state,
        state.challenge_ttl(),
    );
    state.challenges().put(&req.username, ceremony).await?;

    state.metrics().record_challenge_issued("registration");
    tracing::debug!("Issued registration challenge for {}", req.username);

    Ok(Json(RegistrationStartResponse { challenge }))
}

// ============================================================================
// Registration Finish Handler
// ============================================================================

/// POST /auth/register/finish
///
/// Completes registration: consumes the pending ceremony (single use),
/// verifies the authenticator response against it, creates the user and
/// authenticator atomically, and signs the caller in with a session
/// cookie.
pub async fn register_finish(
    State(state): State<AppState>,
    Json(req): Json<RegistrationFinishRequest>,
) -> Result<impl axum::response::IntoResponse, AuthError> {
    // ---
    let ceremony =
        super::consume_pending(&state, &req.username, CeremonyPurpose::Registration).await?;

    let passkey = state
        .verifier()
        .verify_registration(&req.credential, &ceremony.state)?;

    let user = User::new(ceremony.user_id, req.username.clone());
    let authenticator = Authenticator::new(
        passkey.credential_id.clone(),
        user.id,
        passkey.public_key,
        0,
        passkey.transports,
    );
    // A duplicate username or credential raced us since the start call;
    // the registry insert is the authoritative check.
    state
        .registry()
        .create_user_with_authenticator(user, authenticator)
        .await?;

    let token = state.sessions().create(ceremony.user_id, &req.username)?;
    let cookie = state.sessions().cookie(&token);

    state.metrics().record_registration_completed();
    tracing::info!("Registered new user {}", req.username);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(RegistrationFinishResponse {
            user_id: ceremony.user_id,
            username: req.username,
            credential_id: hex::encode(&passkey.credential_id),
        }),
    ))
}
