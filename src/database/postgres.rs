//! PostgreSQL database connection and operations

use crate::config::PostgresConfig;
use crate::error::{Error, Result};
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// PostgreSQL connection pool type alias
pub type PostgresPool = PgPool;

/// Initialize the PostgreSQL connection pool
pub async fn init_pool(config: &PostgresConfig) -> Result<PostgresPool> {
    init_pool_with_options(config, true).await
}

/// Initialize the PostgreSQL connection pool without pgvector check
/// Use this for running migrations before pgvector is installed
pub async fn init_pool_for_migrations(config: &PostgresConfig) -> Result<PostgresPool> {
    init_pool_with_options(config, false).await
}

async fn init_pool_with_options(config: &PostgresConfig, require_pgvector: bool) -> Result<PostgresPool> {
    info!("Initializing PostgreSQL connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| Error::storage("connect", e))?;

    verify_database(&pool, require_pgvector).await?;

    info!("PostgreSQL connection pool initialized successfully");
    Ok(pool)
}

/// Verify database connection and optionally check for pgvector
async fn verify_database(pool: &PgPool, require_pgvector: bool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| Error::storage("connect", e))?;

    if require_pgvector {
        let result: Option<(String,)> =
            sqlx::query_as("SELECT extname FROM pg_extension WHERE extname = 'vector'")
                .fetch_optional(pool)
                .await
                .map_err(|e| Error::storage("connect", e))?;

        if result.is_none() {
            return Err(Error::storage(
                "connect",
                "pgvector extension is not installed. Run `atlas migrate` or: CREATE EXTENSION vector;",
            ));
        }
    }

    Ok(())
}

/// Database migrations
pub mod migrations {
    use super::*;

    /// Enable pgvector. Collection tables are created by the memory store
    /// on startup, since their width comes from configuration.
    pub async fn run(pool: &PgPool) -> Result<()> {
        info!("Running database migrations");

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(pool)
            .await
            .map_err(|e| {
                Error::storage(
                    "migrate",
                    format!("could not create pgvector extension (requires superuser): {}", e),
                )
            })?;

        info!("pgvector extension enabled");
        Ok(())
    }
}
