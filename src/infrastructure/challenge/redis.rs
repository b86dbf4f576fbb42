//! Redis-backed challenge store.
//!
//! Entries are serialized JSON under one key per subject, with the TTL
//! delegated to Redis (`SET ... EX`), so no sweeper task is needed and
//! multiple service instances share the same pending ceremonies.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;

use crate::domain::{ChallengeStore, ChallengeStorePtr, PendingCeremony};

const KEY_PREFIX: &str = "auth:ceremony:";

/// Create a Redis challenge store. Validates the URL eagerly; connections
/// are established per operation via the multiplexed client.
pub fn create_redis_challenge_store(redis_url: &str) -> Result<ChallengeStorePtr> {
    let client = redis::Client::open(redis_url).context("Invalid AUTH_REDIS_URL")?;
    Ok(Arc::new(RedisChallengeStore { client }))
}

struct RedisChallengeStore {
    client: redis::Client,
}

impl RedisChallengeStore {
    fn key(subject: &str) -> String {
        format!("{KEY_PREFIX}{subject}")
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")
    }
}

#[async_trait]
impl ChallengeStore for RedisChallengeStore {
    async fn put(&self, subject: &str, ceremony: PendingCeremony) -> Result<()> {
        // ---
        let payload = serde_json::to_vec(&ceremony)?;
        // Keep the entry alive slightly past its own deadline so consume
        // can still observe it as expired rather than missing.
        let remaining = (ceremony.expires_at - Utc::now()).num_seconds().max(1) as u64;
        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(Self::key(subject), payload, remaining + 1)
            .await
            .context("Failed to store pending ceremony")?;
        Ok(())
    }

    async fn get(&self, subject: &str) -> Result<Option<PendingCeremony>> {
        let mut conn = self.connection().await?;
        let raw: Option<Vec<u8>> = conn
            .get(Self::key(subject))
            .await
            .context("Failed to read pending ceremony")?;
        raw.map(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
            .transpose()
    }

    async fn consume(&self, subject: &str) -> Result<Option<PendingCeremony>> {
        let mut conn = self.connection().await?;
        // GETDEL makes read-and-invalidate one atomic step.
        let raw: Option<Vec<u8>> = redis::cmd("GETDEL")
            .arg(Self::key(subject))
            .query_async(&mut conn)
            .await
            .context("Failed to consume pending ceremony")?;
        raw.map(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
            .transpose()
    }
}
