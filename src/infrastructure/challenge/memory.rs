//! In-memory challenge store with a background expiry sweeper.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::domain::{ChallengeStore, ChallengeStorePtr, PendingCeremony};

/// Create a plain in-memory store with no sweeper.
///
/// Expired entries still refuse to verify (expiry is checked on consume);
/// they are just never reclaimed in the background. Tests use this form.
pub fn create_memory_challenge_store() -> ChallengeStorePtr {
    Arc::new(MemoryChallengeStore::default())
}

/// Create an in-memory store with a periodic sweep task.
///
/// The task holds only a `Weak` reference, so dropping the store stops
/// the sweeper. Must be called from within a tokio runtime.
pub fn create_swept_challenge_store(sweep_interval: Duration) -> ChallengeStorePtr {
    let store = Arc::new(MemoryChallengeStore::default());
    spawn_sweeper(&store, sweep_interval);
    store
}

fn spawn_sweeper(store: &Arc<MemoryChallengeStore>, sweep_interval: Duration) {
    // ---
    let weak: Weak<MemoryChallengeStore> = Arc::downgrade(store);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        // The first tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(store) = weak.upgrade() else {
                break;
            };
            let removed = store.sweep_expired();
            if removed > 0 {
                tracing::debug!("Swept {removed} expired ceremony challenge(s)");
            }
        }
    });
}

#[derive(Default)]
struct MemoryChallengeStore {
    entries: Mutex<HashMap<String, PendingCeremony>>,
}

impl MemoryChallengeStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, PendingCeremony>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("challenge store lock poisoned"))
    }

    fn sweep_expired(&self) -> usize {
        match self.lock() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, ceremony| !ceremony.is_expired());
                before - entries.len()
            }
            Err(_) => 0,
        }
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn put(&self, subject: &str, ceremony: PendingCeremony) -> Result<()> {
        self.lock()?.insert(subject.to_string(), ceremony);
        Ok(())
    }

    async fn get(&self, subject: &str) -> Result<Option<PendingCeremony>> {
        Ok(self.lock()?.get(subject).cloned())
    }

    async fn consume(&self, subject: &str) -> Result<Option<PendingCeremony>> {
        Ok(self.lock()?.remove(subject))
    }
}
