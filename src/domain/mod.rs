mod challenge;
mod metrics;
mod models;
mod registry;
mod verifier;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Publicly expose the authentication domain abstractions
pub use challenge::{CeremonyPurpose, ChallengeStore, ChallengeStorePtr, PendingCeremony};
pub use models::{Authenticator, DeviceType, User};
pub use registry::{CredentialRegistry, RegistryError, RegistryPtr, RegistryResult};
pub use verifier::{AuthenticationOutcome, CeremonyVerifier, RegisteredPasskey, VerifierPtr};
