//! In-memory credential registry.
//!
//! Backs the service in tests and in single-process deployments where no
//! database is available. All state lives behind a single mutex; every
//! operation is a short critical section with no await points, so the
//! std `Mutex` is sufficient.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Authenticator, CredentialRegistry, DeviceType, RegistryError, RegistryPtr, RegistryResult,
    User,
};

/// Create an in-memory registry. State is lost on process exit.
pub fn create_memory_registry() -> RegistryPtr {
    Arc::new(MemoryRegistry::default())
}

#[derive(Default)]
struct MemoryRegistry {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    user_ids_by_name: HashMap<String, Uuid>,
    authenticators: HashMap<Vec<u8>, Authenticator>,
}

impl MemoryRegistry {
    fn lock(&self) -> RegistryResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| RegistryError::Backend(anyhow!("registry lock poisoned")))
    }
}

#[async_trait]
impl CredentialRegistry for MemoryRegistry {
    async fn create_user_with_authenticator(
        &self,
        user: User,
        authenticator: Authenticator,
    ) -> RegistryResult<()> {
        // ---
        let mut inner = self.lock()?;
        if inner.user_ids_by_name.contains_key(&user.username) {
            return Err(RegistryError::DuplicateUsername);
        }
        if inner.authenticators.contains_key(&authenticator.id) {
            return Err(RegistryError::DuplicateCredential);
        }
        inner
            .user_ids_by_name
            .insert(user.username.clone(), user.id);
        inner.users.insert(user.id, user);
        inner
            .authenticators
            .insert(authenticator.id.clone(), authenticator);
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> RegistryResult<Option<User>> {
        let inner = self.lock()?;
        Ok(inner
            .user_ids_by_name
            .get(username)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> RegistryResult<Option<User>> {
        let inner = self.lock()?;
        Ok(inner.users.get(&user_id).cloned())
    }

    async fn find_authenticator(&self, credential_id: &[u8]) -> RegistryResult<Option<Authenticator>> {
        let inner = self.lock()?;
        Ok(inner.authenticators.get(credential_id).cloned())
    }

    async fn list_authenticators(&self, user_id: Uuid) -> RegistryResult<Vec<Authenticator>> {
        let inner = self.lock()?;
        let mut found: Vec<Authenticator> = inner
            .authenticators
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.created_at);
        Ok(found)
    }

    async fn update_counter(&self, credential_id: &[u8], new_counter: u32) -> RegistryResult<()> {
        // ---
        let mut inner = self.lock()?;
        let authenticator = inner
            .authenticators
            .get_mut(credential_id)
            .ok_or(RegistryError::NotFound)?;
        // Authenticators that never increment report zero forever; any
        // other repeat or regression is treated as a cloned credential.
        let accepted =
            new_counter > authenticator.counter || (new_counter == 0 && authenticator.counter == 0);
        if !accepted {
            return Err(RegistryError::CounterRegression);
        }
        authenticator.counter = new_counter;
        Ok(())
    }

    async fn set_backup_state(
        &self,
        credential_id: &[u8],
        device_type: DeviceType,
        backed_up: bool,
    ) -> RegistryResult<()> {
        let mut inner = self.lock()?;
        let authenticator = inner
            .authenticators
            .get_mut(credential_id)
            .ok_or(RegistryError::NotFound)?;
        authenticator.device_type = device_type;
        authenticator.backed_up = backed_up;
        Ok(())
    }

    async fn delete_authenticator(&self, credential_id: &[u8]) -> RegistryResult<()> {
        let mut inner = self.lock()?;
        inner
            .authenticators
            .remove(credential_id)
            .ok_or(RegistryError::NotFound)?;
        Ok(())
    }

    async fn ping(&self) -> RegistryResult<()> {
        Ok(())
    }
}
