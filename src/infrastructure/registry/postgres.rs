//! PostgreSQL-backed credential registry.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::RegistryConfig;
use crate::domain::{
    Authenticator, CredentialRegistry, DeviceType, RegistryError, RegistryPtr, RegistryResult,
    User,
};

const SCHEMA_SQL: &str = include_str!("../../../migrations/0001_create_auth_tables.sql");

/// Create a PostgreSQL registry from config.
///
/// Connects lazily so the router can be built before the database is
/// reachable; the first query establishes the pool.
pub fn create_postgres_registry(config: &RegistryConfig) -> Result<RegistryPtr> {
    // ---
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow!("DATABASE_URL is required for the postgres registry backend"))?;

    let pool = PgPoolOptions::new()
        .acquire_timeout(config.acquire_timeout)
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .connect_lazy(url)
        .context("Invalid DATABASE_URL")?;

    Ok(Arc::new(PostgresRegistry { pool }))
}

/// Apply the schema, retrying while the database comes up.
///
/// Deployments start the service and the database together; the retry
/// loop rides out the window where PostgreSQL is not yet accepting
/// connections.
pub async fn init_postgres_schema(config: &RegistryConfig) -> Result<()> {
    // ---
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow!("DATABASE_URL is required for the postgres registry backend"))?;

    let mut last_err = None;
    for attempt in 1..=config.retry_count {
        match try_init_schema(url).await {
            Ok(()) => {
                tracing::info!("Database schema ready (attempt {attempt})");
                return Ok(());
            }
            Err(err) => {
                tracing::warn!("Database not ready (attempt {attempt}): {err}");
                last_err = Some(err);
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("schema init failed")))
}

async fn try_init_schema(url: &str) -> Result<()> {
    let pool = PgPoolOptions::new().max_connections(1).connect(url).await?;
    sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;
    pool.close().await;
    Ok(())
}

struct PostgresRegistry {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuthenticatorRow {
    id: Vec<u8>,
    user_id: Uuid,
    public_key: Vec<u8>,
    counter: i64,
    device_type: String,
    backed_up: bool,
    transports: String,
    created_at: DateTime<Utc>,
}

impl From<AuthenticatorRow> for Authenticator {
    fn from(row: AuthenticatorRow) -> Self {
        Authenticator {
            id: row.id,
            user_id: row.user_id,
            public_key: row.public_key,
            counter: u32::try_from(row.counter).unwrap_or(u32::MAX),
            device_type: DeviceType::from_str_lossy(&row.device_type),
            backed_up: row.backed_up,
            transports: serde_json::from_str(&row.transports).unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

fn map_insert_error(err: sqlx::Error) -> RegistryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            // The username unique index is the only one on users; every
            // other unique violation here is the credential ID key.
            return match db_err.constraint() {
                Some("users_username_key") => RegistryError::DuplicateUsername,
                _ => RegistryError::DuplicateCredential,
            };
        }
    }
    RegistryError::Backend(err.into())
}

fn backend(err: sqlx::Error) -> RegistryError {
    RegistryError::Backend(err.into())
}

#[async_trait]
impl CredentialRegistry for PostgresRegistry {
    async fn create_user_with_authenticator(
        &self,
        user: User,
        authenticator: Authenticator,
    ) -> RegistryResult<()> {
        // ---
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query("INSERT INTO users (id, username, created_at) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(&user.username)
            .bind(user.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_insert_error)?;

        let transports = serde_json::to_string(&authenticator.transports)
            .map_err(|e| RegistryError::Backend(e.into()))?;
        sqlx::query(
            r#"
            INSERT INTO authenticators
                (id, user_id, public_key, counter, device_type, backed_up, transports, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&authenticator.id)
        .bind(authenticator.user_id)
        .bind(&authenticator.public_key)
        .bind(i64::from(authenticator.counter))
        .bind(authenticator.device_type.as_str())
        .bind(authenticator.backed_up)
        .bind(transports)
        .bind(authenticator.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> RegistryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> RegistryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(User::from))
    }

    async fn find_authenticator(&self, credential_id: &[u8]) -> RegistryResult<Option<Authenticator>> {
        let row = sqlx::query_as::<_, AuthenticatorRow>(
            r#"
            SELECT id, user_id, public_key, counter, device_type, backed_up, transports, created_at
            FROM authenticators WHERE id = $1
            "#,
        )
        .bind(credential_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(Authenticator::from))
    }

    async fn list_authenticators(&self, user_id: Uuid) -> RegistryResult<Vec<Authenticator>> {
        let rows = sqlx::query_as::<_, AuthenticatorRow>(
            r#"
            SELECT id, user_id, public_key, counter, device_type, backed_up, transports, created_at
            FROM authenticators WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(Authenticator::from).collect())
    }

    async fn update_counter(&self, credential_id: &[u8], new_counter: u32) -> RegistryResult<()> {
        // ---
        // The WHERE clause is the compare-and-set: a stale or regressed
        // counter updates zero rows.
        let result = sqlx::query(
            r#"
            UPDATE authenticators SET counter = $2
            WHERE id = $1 AND (counter < $2 OR (counter = 0 AND $2 = 0))
            "#,
        )
        .bind(credential_id)
        .bind(i64::from(new_counter))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM authenticators WHERE id = $1",
        )
        .bind(credential_id)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        if exists == 0 {
            Err(RegistryError::NotFound)
        } else {
            Err(RegistryError::CounterRegression)
        }
    }

    async fn set_backup_state(
        &self,
        credential_id: &[u8],
        device_type: DeviceType,
        backed_up: bool,
    ) -> RegistryResult<()> {
        let result = sqlx::query(
            "UPDATE authenticators SET device_type = $2, backed_up = $3 WHERE id = $1",
        )
        .bind(credential_id)
        .bind(device_type.as_str())
        .bind(backed_up)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound);
        }
        Ok(())
    }

    async fn delete_authenticator(&self, credential_id: &[u8]) -> RegistryResult<()> {
        let result = sqlx::query("DELETE FROM authenticators WHERE id = $1")
            .bind(credential_id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> RegistryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn schema_default_matches_device_type_encoding() {
        // The column default must be a value the code also writes, so
        // rows created either way decode identically.
        let expected = format!("DEFAULT '{}'", DeviceType::Single.as_str());
        assert!(SCHEMA_SQL.contains(&expected));
    }
}
