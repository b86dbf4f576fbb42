use super::models::{Authenticator, DeviceType, User};
use std::sync::Arc;
use uuid::Uuid;

/// Failures the credential registry can report.
///
/// Handlers translate these into the public error taxonomy; backends map
/// their native errors (unique violations, connection failures) onto the
/// matching variant.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    // ---
    #[error("username already registered")]
    DuplicateUsername,

    #[error("credential already registered")]
    DuplicateCredential,

    #[error("no such record")]
    NotFound,

    /// Counter compare-and-set lost: the reported counter was not strictly
    /// greater than the stored one.
    #[error("counter did not advance")]
    CounterRegression,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Durable storage of users and their registered authenticators.
#[async_trait::async_trait]
pub trait CredentialRegistry: Send + Sync {
    // ---
    /// Create a user and their first authenticator as one atomic unit.
    ///
    /// Either both records exist afterwards or neither does; a duplicate
    /// username or credential ID aborts the whole insert.
    async fn create_user_with_authenticator(
        &self,
        user: User,
        authenticator: Authenticator,
    ) -> RegistryResult<()>;

    /// Look up a user by username.
    async fn find_user_by_username(&self, username: &str) -> RegistryResult<Option<User>>;

    /// Look up a user by ID.
    async fn find_user_by_id(&self, user_id: Uuid) -> RegistryResult<Option<User>>;

    /// Look up an authenticator by exact credential ID bytes.
    async fn find_authenticator(&self, credential_id: &[u8]) -> RegistryResult<Option<Authenticator>>;

    /// All authenticators registered by a user.
    async fn list_authenticators(&self, user_id: Uuid) -> RegistryResult<Vec<Authenticator>>;

    /// Advance the signature counter, compare-and-set.
    ///
    /// Accepted iff `new_counter` is strictly greater than the stored value,
    /// or both are zero (authenticators without a counter always report 0).
    /// The comparison happens inside the store so two concurrent
    /// authentications with the same credential cannot both win; the loser
    /// gets `CounterRegression`.
    async fn update_counter(&self, credential_id: &[u8], new_counter: u32) -> RegistryResult<()>;

    /// Refresh authenticator metadata reported by an authentication ceremony.
    async fn set_backup_state(
        &self,
        credential_id: &[u8],
        device_type: DeviceType,
        backed_up: bool,
    ) -> RegistryResult<()>;

    /// Remove an authenticator.
    async fn delete_authenticator(&self, credential_id: &[u8]) -> RegistryResult<()>;

    /// Cheap backend round trip for health checks.
    async fn ping(&self) -> RegistryResult<()>;
}

/// Type alias for any backend that implements CredentialRegistry.
pub type RegistryPtr = Arc<dyn CredentialRegistry>;
