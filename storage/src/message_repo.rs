//! Message repository: the append-only conversation log.
//!
//! Uses SqlitePoolManager and the MessageRecord model. Rows are only ever
//! inserted here or deleted wholesale by the retention sweep.

use crate::error::StorageError;
use crate::models::MessageRecord;
use crate::sqlite_pool::SqlitePoolManager;
use chrono::{DateTime, Utc};
use tracing::info;

#[derive(Clone)]
pub struct MessageRepository {
    pool_manager: SqlitePoolManager,
}

impl MessageRepository {
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_user_id ON messages(user_id)")
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Inserts one immutable turn.
    pub async fn append(
        &self,
        user_id: i64,
        role: &str,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query("INSERT INTO messages (user_id, role, content, timestamp) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(role)
            .bind(content)
            .bind(timestamp)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// All turns for the user, ordered by insertion id ascending.
    pub async fn for_user(&self, user_id: i64) -> Result<Vec<MessageRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let messages = sqlx::query_as::<_, MessageRecord>(
            "SELECT * FROM messages WHERE user_id = ? ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    pub async fn count_for_user(&self, user_id: i64) -> Result<i64, StorageError> {
        let pool = self.pool_manager.pool();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }

    /// Deletes the user's whole log; used by the sweeper before the user row.
    pub async fn delete_for_user(&self, user_id: i64) -> Result<u64, StorageError> {
        let pool = self.pool_manager.pool();

        let result = sqlx::query("DELETE FROM messages WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        info!(
            user_id = user_id,
            deleted = result.rows_affected(),
            "Deleted user's messages"
        );
        Ok(result.rows_affected())
    }
}
