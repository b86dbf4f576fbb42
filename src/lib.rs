// src/lib.rs
use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};

use handlers::{
    app_page, auth_finish, auth_start, delete_credential, health_check, list_credentials,
    list_todos, login_page, logout, me, metrics_handler, register_finish, register_start,
};
use std::env;

// Public exports (visible outside this module)
pub mod domain;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod error;
mod handlers;
mod infrastructure;
mod middleware;
mod session;

// Hoist up only the public symbol(s)
pub use app_state::AppState;
pub use error::AuthError;
pub use session::{session_from_headers, SessionInfo, SessionIssuer, SESSION_COOKIE};

pub use config::*;

// Publicly expose the infrastructure creation functions
pub use infrastructure::{
    create_memory_challenge_store, // ---
    create_memory_registry,
    create_noop_metrics,
    create_postgres_registry,
    create_prom_metrics,
    create_redis_challenge_store,
    create_swept_challenge_store,
    create_webauthn_verifier,
    init_postgres_schema,
};

/// Build the HTTP router with backends determined by environment variables.
pub fn create_router() -> Result<Router> {
    // ---
    // Load all configuration from environment
    let config = AppConfig::from_env()?;

    // Determine metrics implementation from environment
    let metrics_type = env::var("AUTH_METRICS_TYPE").unwrap_or_else(|_| "noop".to_string());
    let metrics = if metrics_type == "prom" {
        create_prom_metrics()?
    } else {
        create_noop_metrics()?
    };

    tracing_subscriber::fmt::try_init().ok(); // Ignores if already initialized

    // Create infrastructure dependencies
    let registry = match config.registry.backend {
        RegistryBackend::Postgres => create_postgres_registry(&config.registry)?,
        RegistryBackend::Memory => create_memory_registry(),
    };
    let challenges = match config.challenge.backend {
        ChallengeBackend::Memory => create_swept_challenge_store(config.challenge.sweep_interval),
        ChallengeBackend::Redis => {
            let url = config.challenge.redis_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("AUTH_REDIS_URL is required for the redis challenge backend")
            })?;
            create_redis_challenge_store(url)?
        }
    };
    let verifier = create_webauthn_verifier(&config.webauthn)?;
    let sessions = SessionIssuer::new(&config.session);

    // Build application state with all dependencies
    let app_state = AppState::new(
        registry,
        challenges,
        verifier,
        sessions,
        metrics,
        config.challenge.ttl,
    );

    Ok(create_router_with(app_state))
}

/// Build the HTTP router around an already-assembled state.
///
/// Tests use this entry point to swap in in-memory backends and a
/// simulated ceremony verifier.
pub fn create_router_with(app_state: AppState) -> Router {
    // ---
    Router::new()
        .route("/", get(app_page))
        .route("/login", get(login_page))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest(
            "/auth",
            Router::new()
                .route("/register/start", post(register_start))
                .route("/register/finish", post(register_finish))
                .route("/login/start", post(auth_start))
                .route("/login/finish", post(auth_finish))
                .route("/logout", post(logout)),
        )
        .nest(
            "/api",
            Router::new()
                .route("/me", get(me))
                .route("/todos", get(list_todos))
                .route("/credentials", get(list_credentials))
                .route("/credentials/{id}", delete(delete_credential))
                .layer(axum::middleware::from_fn_with_state(
                    app_state.clone(),
                    middleware::require_session,
                )),
        )
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::track_requests,
        ))
        .with_state(app_state)
}
