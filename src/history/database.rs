//! SQLite connection setup for the history store
//!
//! - WAL mode for concurrent reads while a request appends
//! - Embedded migrations from `./migrations`

use crate::config::DatabaseConfig;
use crate::error::CostError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Open (creating if missing) the history database and apply migrations
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, CostError> {
    if let Some(parent) = Path::new(&config.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| CostError::Persistence(sqlx::Error::Io(e)))?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(config.busy_timeout_seconds))
        .pragma("synchronous", "NORMAL");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.busy_timeout_seconds))
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    tracing::info!(path = %config.path, "History database ready");

    Ok(pool)
}

/// Single-connection in-memory pool; the database lives as long as the connection
pub async fn connect_in_memory() -> Result<SqlitePool, CostError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), CostError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::debug!("History database migrations completed");
    Ok(())
}
