//! User repository: the per-user ledger of counters and timestamps.
//!
//! Uses SqlitePoolManager and the UserRecord model. Every quota decision
//! reads and mutates rows through this repository; counter mutations are
//! single UPDATE statements so the read-modify-write stays inside SQLite.

use crate::error::StorageError;
use crate::models::UserRecord;
use crate::sqlite_pool::SqlitePoolManager;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

/// Sentinel granted by the administrative override; large enough to never
/// be exhausted by a human.
pub const UNLIMITED_FREE_MESSAGES: i64 = 999_999;

#[derive(Clone)]
pub struct UserRepository {
    pool_manager: SqlitePoolManager,
}

impl UserRepository {
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL,
                free_messages INTEGER NOT NULL DEFAULT 10,
                subscription_end TEXT,
                voice_minutes_today REAL NOT NULL DEFAULT 0,
                last_voice_reset TEXT,
                daily_messages INTEGER NOT NULL DEFAULT 0,
                last_daily_reset TEXT
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, user_id: i64) -> Result<Option<UserRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let user = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Returns the existing record (updating `last_seen`) or creates one
    /// with defaults: 10 free messages, no subscription, reset timers at now.
    pub async fn get_or_create(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, StorageError> {
        if let Some(mut user) = self.get(user_id).await? {
            self.touch_last_seen(user_id, now).await?;
            user.last_seen = now;
            return Ok(user);
        }

        let user = UserRecord::new(user_id, now);
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            INSERT INTO users (user_id, first_seen, last_seen, free_messages, subscription_end,
                               voice_minutes_today, last_voice_reset, daily_messages, last_daily_reset)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.user_id)
        .bind(user.first_seen)
        .bind(user.last_seen)
        .bind(user.free_messages)
        .bind(user.subscription_end)
        .bind(user.voice_minutes_today)
        .bind(user.last_voice_reset)
        .bind(user.daily_messages)
        .bind(user.last_daily_reset)
        .execute(pool)
        .await?;

        info!(user_id = user_id, "Created user with defaults");
        Ok(user)
    }

    pub async fn touch_last_seen(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query("UPDATE users SET last_seen = ? WHERE user_id = ?")
            .bind(now)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Spends one free trial message, clamped at zero.
    pub async fn decrement_free(&self, user_id: i64) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query("UPDATE users SET free_messages = MAX(free_messages - 1, 0) WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Zeroes `daily_messages` if the last reset was 24h or more ago (or
    /// never happened). Returns whether a reset occurred.
    pub async fn reset_daily_if_stale(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let user = self
            .get(user_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("user {}", user_id)))?;

        let stale = match user.last_daily_reset {
            None => true,
            Some(last) => now - last >= Duration::hours(24),
        };
        if !stale {
            return Ok(false);
        }

        let pool = self.pool_manager.pool();
        sqlx::query("UPDATE users SET daily_messages = 0, last_daily_reset = ? WHERE user_id = ?")
            .bind(now)
            .bind(user_id)
            .execute(pool)
            .await?;

        info!(user_id = user_id, "Daily message counter reset");
        Ok(true)
    }

    /// Increments `daily_messages` and returns the post-increment count.
    pub async fn increment_daily(&self, user_id: i64) -> Result<i64, StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query("UPDATE users SET daily_messages = daily_messages + 1 WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        let count: (i64,) = sqlx::query_as("SELECT daily_messages FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }

    /// Resets `voice_minutes_today` if the last voice reset was 24h or more
    /// ago, then returns whether the current total (post-reset, before adding
    /// the pending message's duration) is under `limit_minutes`.
    pub async fn check_and_reset_voice_limit(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
        limit_minutes: f64,
    ) -> Result<bool, StorageError> {
        let user = self
            .get(user_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("user {}", user_id)))?;

        let stale = match user.last_voice_reset {
            None => true,
            Some(last) => now - last >= Duration::hours(24),
        };
        if stale {
            let pool = self.pool_manager.pool();
            sqlx::query(
                "UPDATE users SET voice_minutes_today = 0, last_voice_reset = ? WHERE user_id = ?",
            )
            .bind(now)
            .bind(user_id)
            .execute(pool)
            .await?;

            info!(user_id = user_id, "Voice minutes counter reset");
            return Ok(0.0 < limit_minutes);
        }

        Ok(user.voice_minutes_today < limit_minutes)
    }

    pub async fn add_voice_minutes(
        &self,
        user_id: i64,
        minutes: f64,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            "UPDATE users SET voice_minutes_today = voice_minutes_today + ? WHERE user_id = ?",
        )
        .bind(minutes)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Administrative override: subscription until `now + days` and a free
    /// counter no human exhausts. Creates the record if absent.
    pub async fn grant_unlimited_access(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
        days: i64,
    ) -> Result<(), StorageError> {
        self.get_or_create(user_id, now).await?;

        let pool = self.pool_manager.pool();
        sqlx::query("UPDATE users SET subscription_end = ?, free_messages = ? WHERE user_id = ?")
            .bind(now + Duration::days(days))
            .bind(UNLIMITED_FREE_MESSAGES)
            .bind(user_id)
            .execute(pool)
            .await?;

        info!(user_id = user_id, days = days, "Granted unlimited access");
        Ok(())
    }

    /// Activates or extends a subscription until the given end timestamp.
    pub async fn set_subscription_end(
        &self,
        user_id: i64,
        end: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query("UPDATE users SET subscription_end = ? WHERE user_id = ?")
            .bind(end)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// All ledger rows; input to the retention sweep.
    pub async fn all_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let users = sqlx::query_as::<_, UserRecord>("SELECT * FROM users ORDER BY user_id")
            .fetch_all(pool)
            .await?;

        Ok(users)
    }

    pub async fn delete(&self, user_id: i64) -> Result<bool, StorageError> {
        let pool = self.pool_manager.pool();

        let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
