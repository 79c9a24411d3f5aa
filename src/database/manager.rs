use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Database pool not initialized")]
    NotInitialized,

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Holder for the single process-wide connection pool.
///
/// The pool is created exactly once at startup via `init` and shared by
/// handle afterwards. Handlers never build their own pool.
pub struct DatabaseManager;

static POOL: OnceLock<PgPool> = OnceLock::new();

impl DatabaseManager {
    /// Connect and install the shared pool. Second calls are no-ops.
    pub async fn init() -> Result<(), DatabaseError> {
        if POOL.get().is_some() {
            return Ok(());
        }

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let db_config = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(Duration::from_secs(db_config.connection_timeout))
            .connect(&database_url)
            .await?;

        // Lost the race with a concurrent init; the extra pool is dropped.
        if POOL.set(pool).is_ok() {
            info!("Database pool initialized");
        }
        Ok(())
    }

    /// Shared pool handle. Cloning a PgPool is cheap (internal Arc).
    pub fn pool() -> Result<PgPool, DatabaseError> {
        POOL.get().cloned().ok_or(DatabaseError::NotInitialized)
    }

    /// Apply pending migrations from the embedded `migrations/` directory.
    pub async fn migrate() -> Result<(), DatabaseError> {
        let pool = Self::pool()?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool()?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close() {
        if let Some(pool) = POOL.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
