//! Message record model for persistence.
//!
//! Maps to the `messages` table and is used by MessageRepository. Records are
//! immutable once written; ordering by `id` reconstructs the conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRecord {
    /// Monotonic insertion-ordered id (SQLite AUTOINCREMENT).
    pub id: i64,
    pub user_id: i64,
    /// `user`, `assistant`, or `system`.
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
