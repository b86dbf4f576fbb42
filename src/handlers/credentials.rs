//! Credential management handlers.
//!
//! Lets a signed-in user inspect and remove their own passkeys. The
//! session gate runs before these handlers, so the verified session is
//! always present as a request extension.

use axum::{
    extract::{Path, State},
    Extension,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Serialize;

use crate::app_state::AppState;
use crate::error::AuthError;
use crate::handlers::shared_types::ApiResponse;
use crate::session::SessionInfo;

#[derive(Debug, Serialize)]
pub struct CredentialSummary {
    // ---
    /// Base64url credential ID, usable as the path parameter for delete.
    pub id: String,
    pub device_type: String,
    pub backed_up: bool,
    pub transports: Vec<String>,
    pub created_at: String,
}

/// GET /api/credentials
///
/// Lists the caller's registered passkeys.
pub async fn list_credentials(
    State(state): State<AppState>,
    Extension(session): Extension<SessionInfo>,
) -> Result<ApiResponse<Vec<CredentialSummary>>, AuthError> {
    // ---
    let authenticators = state.registry().list_authenticators(session.user_id).await?;
    let summaries = authenticators
        .into_iter()
        .map(|a| CredentialSummary {
            id: URL_SAFE_NO_PAD.encode(&a.id),
            device_type: a.device_type.as_str().to_string(),
            backed_up: a.backed_up,
            transports: a.transports,
            created_at: a.created_at.to_rfc3339(),
        })
        .collect();
    Ok(ApiResponse { data: summaries })
}

#[derive(Debug, Serialize)]
pub struct CredentialDeleted {
    // ---
    pub deleted: String,
}

/// DELETE /api/credentials/{id}
///
/// Removes one of the caller's passkeys. Deleting another user's
/// credential is forbidden even when its ID is known.
pub async fn delete_credential(
    State(state): State<AppState>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<String>,
) -> Result<ApiResponse<CredentialDeleted>, AuthError> {
    // ---
    let credential_id = URL_SAFE_NO_PAD
        .decode(&id)
        .map_err(|_| AuthError::AuthenticatorNotFound)?;

    let authenticator = state
        .registry()
        .find_authenticator(&credential_id)
        .await?
        .ok_or(AuthError::AuthenticatorNotFound)?;
    if authenticator.user_id != session.user_id {
        return Err(AuthError::Forbidden);
    }

    state.registry().delete_authenticator(&credential_id).await?;
    tracing::info!("User {} deleted credential {}", session.username, id);

    Ok(ApiResponse {
        data: CredentialDeleted { deleted: id },
    })
}
