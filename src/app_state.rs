//! Application state management.
//!
//! This module defines the shared state structure that gets passed to all
//! Axum handlers via the `State` extractor. The `AppState` contains shared
//! resources: the credential registry, the challenge store, the ceremony
//! verifier, the session issuer and the metrics implementation.
//!
//! The state is designed to be cheaply cloneable (using `Arc` internally
//! where needed) so it can be passed efficiently to each request handler
//! without expensive copying of resources.

use crate::domain::{ChallengeStorePtr, MetricsPtr, RegistryPtr, VerifierPtr};
use crate::session::SessionIssuer;
use std::time::Duration;

/// Shared application state passed to all Axum handlers.
///
/// This struct serves as the Dependency Injection container for the
/// application. Handlers depend on the trait abstractions it holds
/// (CredentialRegistry, ChallengeStore, CeremonyVerifier), not on concrete
/// backends, which is what lets integration tests swap in in-memory stores
/// and a mock verifier. State is built once at startup and never mutated;
/// all heavy resources live behind an `Arc` so per-request cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Durable storage of users and registered authenticators.
    registry: RegistryPtr,

    /// Pending ceremonies with TTL.
    challenges: ChallengeStorePtr,

    /// Ceremony verification against the relying-party configuration.
    verifier: VerifierPtr,

    /// Stateless session-token issuer.
    sessions: SessionIssuer,

    /// Metrics implementation (Prometheus or no-op).
    metrics: MetricsPtr,

    /// Time-to-live for pending ceremonies. Typically 5 minutes.
    challenge_ttl: Duration,
}

impl AppState {
    // ---

    pub fn new(
        registry: RegistryPtr,
        challenges: ChallengeStorePtr,
        verifier: VerifierPtr,
        sessions: SessionIssuer,
        metrics: MetricsPtr,
        challenge_ttl: Duration,
    ) -> Self {
        // ---
        AppState {
            registry,
            challenges,
            verifier,
            sessions,
            metrics,
            challenge_ttl,
        }
    }

    /// Get a reference to the credential registry.
    pub fn registry(&self) -> &RegistryPtr {
        // ---
        &self.registry
    }

    /// Get a reference to the challenge store.
    pub fn challenges(&self) -> &ChallengeStorePtr {
        // ---
        &self.challenges
    }

    /// Get a reference to the ceremony verifier.
    pub fn verifier(&self) -> &VerifierPtr {
        // ---
        &self.verifier
    }

    /// Get a reference to the session issuer.
    pub fn sessions(&self) -> &SessionIssuer {
        // ---
        &self.sessions
    }

    /// Get a reference to the metrics implementation.
    pub fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }

    /// Get the pending-ceremony TTL.
    pub fn challenge_ttl(&self) -> Duration {
        // ---
        self.challenge_ttl
    }
}

#[cfg(test)]
mod tests {
    // ---

    use super::*;
    use crate::config::{SessionConfig, WebAuthnConfig};
    use crate::infrastructure::{
        create_memory_challenge_store, create_memory_registry, create_noop_metrics,
        create_webauthn_verifier,
    };

    fn test_webauthn_config() -> WebAuthnConfig {
        // ---
        WebAuthnConfig {
            rp_id: "localhost".to_string(),
            rp_name: "Test App".to_string(),
            origin: "http://localhost:8080".to_string(),
        }
    }

    fn test_session_config() -> SessionConfig {
        // ---
        SessionConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
            ttl: Duration::from_secs(604_800),
            cookie_secure: false,
        }
    }

    #[test]
    fn test_app_state_creation_and_clone() {
        // ---
        // Test basic creation and that Clone works
        let registry = create_memory_registry();
        let challenges = create_memory_challenge_store();
        let verifier = create_webauthn_verifier(&test_webauthn_config()).unwrap();
        let sessions = SessionIssuer::new(&test_session_config());
        let metrics = create_noop_metrics().unwrap();

        let app_state = AppState::new(
            registry,
            challenges,
            verifier,
            sessions,
            metrics,
            Duration::from_secs(300),
        );
        let _cloned = app_state.clone();

        // Verify accessors work
        let _registry_ref = app_state.registry();
        let _challenges_ref = app_state.challenges();
        let _verifier_ref = app_state.verifier();
        let _sessions_ref = app_state.sessions();
        let _metrics_ref = app_state.metrics();
        assert_eq!(app_state.challenge_ttl(), Duration::from_secs(300));
    }
}
