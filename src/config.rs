// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::Result;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
///
/// Missing configuration is treated as a deployment error,
/// not a recoverable runtime condition.
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .map_err(|_| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. This macro is appropriate for non-critical
/// tuning parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
///
/// This macro is intended for config unit tests only and enforces
/// consistent error messages across failure cases.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
/// All required configuration is validated eagerly during initialization.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub registry: registry::RegistryConfig,
    pub challenge: challenge::ChallengeConfig,
    pub webauthn: webauthn::WebAuthnConfig,
    pub session: session::SessionConfig,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    /// This function is intended to be called exactly once at startup.
    pub fn from_env() -> Result<Self> {
        // ---
        Ok(Self {
            registry: registry::RegistryConfig::from_env()?,
            challenge: challenge::ChallengeConfig::from_env()?,
            webauthn: webauthn::WebAuthnConfig::from_env()?,
            session: session::SessionConfig::from_env()?,
        })
    }
}

// ============================================================
// Credential registry configuration
// ============================================================

mod registry {
    // ---
    use super::*;

    /// Which backend holds users and credentials.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RegistryBackend {
        /// Durable PostgreSQL storage (production).
        Postgres,
        /// Process-local maps (development, tests).
        Memory,
    }

    /// Credential-registry configuration derived from environment variables.
    #[derive(Debug, Clone)]
    pub struct RegistryConfig {
        pub backend: RegistryBackend,

        /// PostgreSQL connection string. Required for the postgres backend.
        pub database_url: Option<String>,

        /// Number of retry attempts when initializing the database schema. Defaults to 50.
        pub retry_count: u32,

        /// Maximum time to wait when acquiring a connection from the pool. Defaults to 30 seconds.
        pub acquire_timeout: Duration,

        /// Minimum number of connections to keep in the pool, even when idle. Defaults to 2.
        pub min_connections: u32,

        /// Maximum number of connections to be open concurrently. Defaults to 15.
        pub max_connections: u32,
    }

    impl RegistryConfig {
        /// Builds a [`RegistryConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if the postgres backend is selected and
        /// `DATABASE_URL` is missing. Startup fails fast rather than
        /// continuing with incomplete configuration.
        pub fn from_env() -> Result<Self> {
            // ---
            let backend = match std::env::var("AUTH_REGISTRY_BACKEND").as_deref() {
                Ok("memory") => RegistryBackend::Memory,
                _ => RegistryBackend::Postgres,
            };

            let database_url = match backend {
                RegistryBackend::Postgres => Some(required_env!("DATABASE_URL")),
                RegistryBackend::Memory => std::env::var("DATABASE_URL").ok(),
            };

            let retry_count = optional_env_parse!("AUTH_DB_RETRY_COUNT", u32, 50);
            let acquire_timeout_secs = optional_env_parse!("AUTH_DB_ACQUIRE_TIMEOUT_SEC", u64, 30);
            let min_connections = optional_env_parse!("AUTH_DB_MIN_CONNECTIONS", u32, 2);
            let max_connections = optional_env_parse!("AUTH_DB_MAX_CONNECTIONS", u32, 15);

            Ok(Self {
                backend,
                database_url,
                retry_count,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
                min_connections,
                max_connections,
            })
        }
    }
}
pub use registry::{RegistryBackend, RegistryConfig};

// ============================================================
// Challenge store configuration
// ============================================================

mod challenge {
    // ---
    use super::*;

    /// Which backend holds pending ceremony challenges.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ChallengeBackend {
        /// In-process map with a background expiry sweep (default).
        Memory,
        /// Redis, for deployments with more than one instance.
        Redis,
    }

    /// Challenge-store configuration.
    ///
    /// Challenges are single-use and expire after `ttl`; the in-memory
    /// backend additionally sweeps abandoned entries every
    /// `sweep_interval` so the store stays bounded.
    #[derive(Debug, Clone)]
    pub struct ChallengeConfig {
        pub backend: ChallengeBackend,

        /// Redis connection string. Required for the redis backend.
        pub redis_url: Option<String>,

        /// Time-to-live for a pending ceremony. Defaults to 5 minutes.
        pub ttl: Duration,

        /// How often the in-memory store reaps expired entries. Defaults to 5 minutes.
        pub sweep_interval: Duration,
    }

    impl ChallengeConfig {
        /// Builds a [`ChallengeConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if the redis backend is selected and
        /// `AUTH_REDIS_URL` is missing.
        pub fn from_env() -> Result<Self> {
            // ---
            let backend = match std::env::var("AUTH_CHALLENGE_BACKEND").as_deref() {
                Ok("redis") => ChallengeBackend::Redis,
                _ => ChallengeBackend::Memory,
            };

            let redis_url = match backend {
                ChallengeBackend::Redis => Some(required_env!("AUTH_REDIS_URL")),
                ChallengeBackend::Memory => std::env::var("AUTH_REDIS_URL").ok(),
            };

            let ttl_secs = optional_env_parse!("AUTH_CHALLENGE_TTL_SEC", u64, 300);
            let sweep_secs = optional_env_parse!("AUTH_CHALLENGE_SWEEP_SEC", u64, 300);

            Ok(Self {
                backend,
                redis_url,
                ttl: Duration::from_secs(ttl_secs),
                sweep_interval: Duration::from_secs(sweep_secs),
            })
        }
    }
}
pub use challenge::{ChallengeBackend, ChallengeConfig};

// ============================================================
// WebAuthn configuration
// ============================================================

mod webauthn {
    // ---
    use super::*;

    /// WebAuthn / Passkeys configuration.
    ///
    /// These values define the relying party identity and security
    /// origin used during WebAuthn registration and authentication.
    #[derive(Debug, Clone)]
    pub struct WebAuthnConfig {
        /// Relying Party ID (typically a domain name).
        pub rp_id: String,

        /// Human-readable Relying Party name.
        pub rp_name: String,

        /// Fully-qualified origin (e.g. https://example.com).
        pub origin: String,
    }

    impl WebAuthnConfig {
        /// Builds a [`WebAuthnConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if required configuration is missing.
        /// WebAuthn configuration is considered security-critical
        /// and must be explicitly provided.
        pub fn from_env() -> Result<Self> {
            // ---
            let rp_id = required_env!("AUTH_WEBAUTHN_RP_ID");
            let origin = required_env!("AUTH_WEBAUTHN_ORIGIN");

            let rp_name =
                std::env::var("AUTH_WEBAUTHN_RP_NAME").unwrap_or_else(|_| "Todo".to_string());

            Ok(Self {
                rp_id,
                rp_name,
                origin,
            })
        }
    }
}
pub use webauthn::WebAuthnConfig;

// ============================================================
// Session configuration
// ============================================================

mod session {
    // ---
    use super::*;

    /// Session-token configuration.
    ///
    /// Sessions are stateless signed tokens; validity is entirely a
    /// function of the signature and expiry, so the signing secret is the
    /// whole security boundary and must be provided explicitly.
    #[derive(Debug, Clone)]
    pub struct SessionConfig {
        /// HMAC secret for signing session tokens. At least 32 bytes.
        pub secret: String,

        /// Session lifetime. Defaults to 7 days.
        pub ttl: Duration,

        /// Whether to set the `Secure` attribute on the session cookie.
        /// Enable in production (HTTPS).
        pub cookie_secure: bool,
    }

    impl SessionConfig {
        /// Builds a [`SessionConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if the secret is missing or shorter than
        /// 32 bytes.
        pub fn from_env() -> Result<Self> {
            // ---
            let secret = required_env!("AUTH_SESSION_SECRET");
            if secret.len() < 32 {
                anyhow::bail!("AUTH_SESSION_SECRET must be at least 32 bytes");
            }

            let ttl_secs = optional_env_parse!("AUTH_SESSION_TTL_SEC", u64, 604_800);
            let cookie_secure = optional_env_parse!("AUTH_COOKIE_SECURE", bool, false);

            Ok(Self {
                secret,
                ttl: Duration::from_secs(ttl_secs),
                cookie_secure,
            })
        }
    }
}
pub use session::SessionConfig;

// ============================================================
// Tests
// ============================================================
