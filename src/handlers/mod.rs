// Gateway module - controls public API for handlers
// Modules are private, only exported symbols are public

mod authenticate;
mod credentials;
mod health;
mod metrics;
mod pages;
mod register;
mod session;
mod shared_types;
mod todos;

// Core handlers
pub use health::health_check;
pub use metrics::metrics_handler;
pub use pages::{app_page, login_page};

// Ceremony handlers
pub use authenticate::{auth_finish, auth_start};
pub use register::{register_finish, register_start};

// Session handlers
pub use session::{logout, me};

// Credential management handlers
pub use credentials::{delete_credential, list_credentials};

// Protected resource handlers
pub use todos::list_todos;

use crate::app_state::AppState;
use crate::domain::{CeremonyPurpose, PendingCeremony};
use crate::error::AuthError;
use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("valid username regex"));

/// 3-30 characters, ASCII alphanumeric or underscore.
pub(crate) fn validate_username(username: &str) -> Result<(), AuthError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(AuthError::InvalidUsername(
            "username must be 3-30 characters of letters, digits or underscore".to_string(),
        ))
    }
}

/// Pull the pending ceremony for `subject` out of the challenge store,
/// enforcing single use, expiry and purpose in that order.
pub(crate) async fn consume_pending(
    state: &AppState,
    subject: &str,
    purpose: CeremonyPurpose,
) -> Result<PendingCeremony, AuthError> {
    // ---
    let ceremony = state
        .challenges()
        .consume(subject)
        .await?
        .ok_or(AuthError::ChallengeMissing)?;
    if ceremony.is_expired() {
        return Err(AuthError::ChallengeExpired);
    }
    if ceremony.purpose != purpose {
        return Err(AuthError::PurposeMismatch);
    }
    Ok(ceremony)
}
