use anyhow::Result;
use std::env;
use tracing::info;

use todo_auth::{create_router, init_postgres_schema, AppConfig, RegistryBackend};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (if present) before reading any configuration
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber to log to stdout
    tracing_subscriber::fmt::init();
    info!("Starting todo-auth server v{}...", env!("CARGO_PKG_VERSION"));

    // Make sure the schema exists before the first request needs it
    let config = AppConfig::from_env()?;
    if config.registry.backend == RegistryBackend::Postgres {
        init_postgres_schema(&config.registry).await?;
    }

    let app = create_router()?;

    // Get optional bind endpoint from environment
    let endpoint = env::var("AUTH_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    info!("Listening on {}", endpoint);

    let listener = tokio::net::TcpListener::bind(&endpoint).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
