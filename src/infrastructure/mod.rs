mod challenge;
pub mod metrics;
mod registry;
mod webauthn;

// Re-export the factory functions for easy access
pub use challenge::{
    create_memory_challenge_store, create_redis_challenge_store, create_swept_challenge_store,
};
pub use metrics::{create_noop_metrics, create_prom_metrics};
pub use registry::{create_memory_registry, create_postgres_registry, init_postgres_schema};
pub use webauthn::create_webauthn_verifier;
