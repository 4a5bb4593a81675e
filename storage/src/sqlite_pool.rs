//! The single shared SQLite handle behind all repositories.
//!
//! The bot runs one process with one pool; per-user counter updates are
//! single statements, so the pool's serialization is the only locking.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::info;

use crate::error::StorageError;

/// Owns the pool; cloned into every repository.
#[derive(Clone)]
pub struct SqlitePoolManager {
    pool: SqlitePool,
}

impl SqlitePoolManager {
    /// Opens (creating if missing) the database at the given path.
    /// `:memory:` gives a private in-memory database, used by tests.
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        info!(database_url = %database_url, "Opening SQLite database");

        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePool::connect_with(options).await?;

        Ok(Self { pool })
    }

    /// The underlying pool for running queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
