use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// What a pending ceremony was issued for. Completing a ceremony with a
/// challenge issued for the other purpose is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CeremonyPurpose {
    Registration,
    Authentication,
}

/// A pending ceremony, keyed by subject (username) in the challenge store.
///
/// `state` is the serialized verifier state for the ceremony; it embeds the
/// nonce the client must sign. The entry is single-use: verification goes
/// through [`ChallengeStore::consume`], never `get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingCeremony {
    // ---
    pub purpose: CeremonyPurpose,

    /// The user the ceremony is bound to. For registration this ID is not
    /// yet persisted; the user record is created at ceremony completion.
    pub user_id: Uuid,

    /// Opaque serialized ceremony state (embeds the challenge nonce).
    pub state: Vec<u8>,

    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingCeremony {
    // ---
    pub fn new(purpose: CeremonyPurpose, user_id: Uuid, state: Vec<u8>, ttl: Duration) -> Self {
        // ---
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::seconds(300));
        Self {
            purpose,
            user_id,
            state,
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        // ---
        self.expires_at <= Utc::now()
    }
}

/// Keyed store of pending ceremonies with a bounded time-to-live.
///
/// One entry per subject: `put` unconditionally replaces whatever ceremony
/// was pending for that subject, invalidating it (last write wins; the
/// concurrent-put race is accepted since ceremonies are single-flight per
/// user in normal use). Expired entries must eventually be reclaimed even
/// if never read, so abandoned ceremonies do not grow the store forever.
#[async_trait::async_trait]
pub trait ChallengeStore: Send + Sync {
    // ---
    /// Record a pending ceremony for `subject`, replacing any existing one.
    async fn put(&self, subject: &str, ceremony: PendingCeremony) -> Result<()>;

    /// Peek at the pending ceremony without removing it. A ceremony read
    /// this way does not count as consumed.
    async fn get(&self, subject: &str) -> Result<Option<PendingCeremony>>;

    /// Atomically remove and return the pending ceremony. This is the only
    /// path verification uses; a second consume for the same subject finds
    /// nothing.
    async fn consume(&self, subject: &str) -> Result<Option<PendingCeremony>>;
}

/// Type alias for any backend that implements ChallengeStore.
pub type ChallengeStorePtr = Arc<dyn ChallengeStore>;
