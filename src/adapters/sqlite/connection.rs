//! SQLite connection pool setup.
//!
//! One pool per process. WAL journaling with a generous busy timeout so
//! the CLI and a running `serve` can share the same database file.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to create connection pool: {0}")]
    PoolCreationFailed(#[from] sqlx::Error),

    #[error("invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("failed to create database directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),
}

/// Opens (and creates if missing) the SQLite database at `database_url`.
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, ConnectionError> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .ok_or_else(|| ConnectionError::InvalidDatabaseUrl(database_url.to_string()))?;

    ensure_database_directory(path)?;

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| ConnectionError::InvalidDatabaseUrl(e.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// In-memory pool for tests. Shared cache with a single connection so
/// every query sees the same database.
pub async fn create_test_pool() -> Result<SqlitePool, ConnectionError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| ConnectionError::InvalidDatabaseUrl(e.to_string()))?
        .shared_cache(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

// The default database lives under `.synapse/`, which may not exist yet
// on first run.
fn ensure_database_directory(path: &str) -> Result<(), ConnectionError> {
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Ok(())
}
