//! Passkey authentication handlers.
//!
//! Implements the two-phase authentication ceremony:
//! 1. `auth_start` - Build an allow-list challenge from the user's
//!    registered credentials
//! 2. `auth_finish` - Verify the assertion, enforce counter monotonicity
//!    and issue a session cookie

use axum::{extract::State, http::header, response::AppendHeaders, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use webauthn_rs::prelude::PublicKeyCredential;

use crate::app_state::AppState;
use crate::domain::{CeremonyPurpose, DeviceType, PendingCeremony, RegistryError};
use crate::error::AuthError;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AuthStartRequest {
    // ---
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct AuthStartResponse {
    // ---
    /// WebAuthn credential request options, passed by the client to
    /// `navigator.credentials.get()`. The allow-list names only this
    /// user's credentials.
    pub options: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct AuthFinishRequest {
    // ---
    pub username: String,
    pub credential: PublicKeyCredential,
}

#[derive(Debug, Serialize)]
pub struct AuthFinishResponse {
    // ---
    pub user_id: Uuid,
    pub username: String,
}

// ============================================================================
// Authentication Start Handler
// ============================================================================

/// POST /auth/login/start
///
/// Initiates passkey authentication for a registered username.
pub async fn auth_start(
    State(state): State<AppState>,
    Json(req): Json<AuthStartRequest>,
) -> Result<Json<AuthStartResponse>, AuthError> {
    // ---
    let user = state
        .registry()
        .find_user_by_username(&req.username)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    let authenticators = state.registry().list_authenticators(user.id).await?;
    if authenticators.is_empty() {
        // A user row with no credentials cannot log in; indistinguishable
        // from an unknown user as far as the client is concerned.
        return Err(AuthError::UnknownUser);
    }

    let (options, ceremony_state) = state.verifier().authentication_options(&authenticators)?;

    let ceremony = PendingCeremony::new(
        CeremonyPurpose::Authentication,
        user.id,
        ceremony_state,
        state.challenge_ttl(),
    );
    state.challenges().put(&req.username, ceremony).await?;

    state.metrics().record_challenge_issued("authentication");
    tracing::debug!("Issued authentication challenge for {}", req.username);

    Ok(Json(AuthStartResponse { options }))
}

// ============================================================================
// Authentication Finish Handler
// ============================================================================

/// POST /auth/login/finish
///
/// Completes authentication: consumes the pending ceremony, verifies the
/// assertion, advances the signature counter (rejecting regressions as
/// suspected replays), refreshes the credential's backup flags, and
/// issues a session cookie.
pub async fn auth_finish(
    State(state): State<AppState>,
    Json(req): Json<AuthFinishRequest>,
) -> Result<impl axum::response::IntoResponse, AuthError> {
    // ---
    let ceremony =
        super::consume_pending(&state, &req.username, CeremonyPurpose::Authentication).await?;

    let outcome = match state
        .verifier()
        .verify_authentication(&req.credential, &ceremony.state)
    {
        Ok(outcome) => outcome,
        Err(err) => {
            state.metrics().record_authentication(false);
            return Err(err);
        }
    };

    // Exact credential ID bytes only; an assertion for a credential we
    // do not hold fails even if it would otherwise verify.
    let authenticator = state
        .registry()
        .find_authenticator(&outcome.credential_id)
        .await?
        .ok_or(AuthError::AuthenticatorNotFound)?;
    if authenticator.user_id != ceremony.user_id {
        return Err(AuthError::AuthenticatorNotFound);
    }

    if let Err(err) = state
        .registry()
        .update_counter(&authenticator.id, outcome.counter)
        .await
    {
        if matches!(err, RegistryError::CounterRegression) {
            tracing::warn!(
                "Signature counter regression for {} (stored {}, reported {})",
                req.username,
                authenticator.counter,
                outcome.counter
            );
            state.metrics().record_replay_suspected();
            state.metrics().record_authentication(false);
        }
        return Err(err.into());
    }

    let device_type = if outcome.backup_eligible {
        DeviceType::Multi
    } else {
        DeviceType::Single
    };
    state
        .registry()
        .set_backup_state(&authenticator.id, device_type, outcome.backup_state)
        .await?;

    let user = state
        .registry()
        .find_user_by_id(authenticator.user_id)
        .await?
        .ok_or_else(|| AuthError::Internal(anyhow::anyhow!("authenticator without user")))?;

    let token = state.sessions().create(user.id, &user.username)?;
    let cookie = state.sessions().cookie(&token);

    state.metrics().record_authentication(true);
    tracing::info!("Authenticated user {}", user.username);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(AuthFinishResponse {
            user_id: user.id,
            username: user.username,
        }),
    ))
}
