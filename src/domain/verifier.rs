use super::models::Authenticator;
use crate::error::AuthError;
use std::sync::Arc;
use uuid::Uuid;
use webauthn_rs::prelude::{PublicKeyCredential, RegisterPublicKeyCredential};

/// Credential material extracted from a verified registration response.
#[derive(Debug, Clone)]
pub struct RegisteredPasskey {
    // ---
    /// Canonical credential ID bytes, unique across the registry.
    pub credential_id: Vec<u8>,

    /// Serialized public-key material for later signature verification.
    pub public_key: Vec<u8>,

    /// Transports the client reported for this credential.
    pub transports: Vec<String>,
}

/// Result of a verified authentication response.
#[derive(Debug, Clone)]
pub struct AuthenticationOutcome {
    // ---
    /// Credential the assertion was signed with, exact bytes.
    pub credential_id: Vec<u8>,

    /// Counter value the authenticator reported for this assertion.
    pub counter: u32,

    /// Whether the credential is eligible for backup (multi-device).
    pub backup_eligible: bool,

    /// Whether the credential is currently backed up.
    pub backup_state: bool,
}

/// Stateless ceremony verification against the relying-party configuration.
///
/// Implementations validate responses against the expected origin, RP ID and
/// the nonce embedded in the opaque `state` bytes they produced at options
/// time. All methods are CPU-bound and run without holding any lock; the
/// stateful half of a ceremony lives in the [`ChallengeStore`].
///
/// Integration tests provide a verifier that accepts simulated
/// authenticator responses; exercising the real one end to end would
/// require browser automation.
///
/// [`ChallengeStore`]: super::challenge::ChallengeStore
pub trait CeremonyVerifier: Send + Sync {
    // ---
    /// Build registration options for a new credential. Returns the
    /// client-facing options JSON and the opaque server-side state to stash
    /// in the challenge store. `exclude` lists credential IDs the user
    /// already registered.
    fn registration_options(
        &self,
        user_id: Uuid,
        username: &str,
        exclude: Vec<Vec<u8>>,
    ) -> Result<(serde_json::Value, Vec<u8>), AuthError>;

    /// Verify a registration response against the stored state. Any
    /// mismatch (signature, origin, RP ID, nonce) is `VerificationFailed`.
    fn verify_registration(
        &self,
        credential: &RegisterPublicKeyCredential,
        state: &[u8],
    ) -> Result<RegisteredPasskey, AuthError>;

    /// Build authentication options. The allow-list is restricted to the
    /// given authenticators, which the caller has already scoped to one
    /// user; other users' credentials are never disclosed.
    fn authentication_options(
        &self,
        authenticators: &[Authenticator],
    ) -> Result<(serde_json::Value, Vec<u8>), AuthError>;

    /// Verify an authentication response against the stored state.
    fn verify_authentication(
        &self,
        credential: &PublicKeyCredential,
        state: &[u8],
    ) -> Result<AuthenticationOutcome, AuthError>;
}

/// Type alias for any backend that implements CeremonyVerifier.
pub type VerifierPtr = Arc<dyn CeremonyVerifier>;
