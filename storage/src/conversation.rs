//! Conversation store: append-only turn log with retention-gated retrieval.

use crate::error::StorageError;
use crate::message_repo::MessageRepository;
use crate::models::MessageRecord;
use crate::user_repo::UserRepository;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Couples the message log with the ledger so history retrieval can honor
/// the subscription memory window.
#[derive(Clone)]
pub struct ConversationStore {
    users: UserRepository,
    messages: MessageRepository,
}

impl ConversationStore {
    pub fn new(users: UserRepository, messages: MessageRepository) -> Self {
        Self { users, messages }
    }

    /// Inserts one immutable turn (`role` is `user`, `assistant`, or `system`).
    pub async fn append(
        &self,
        user_id: i64,
        role: &str,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.messages.append(user_id, role, content, timestamp).await
    }

    /// Conversation history in insertion order. Empty when the user has no
    /// record, never subscribed, or lapsed past the retention grace (the
    /// same boundary at which the sweeper deletes the data).
    pub async fn history(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let user = match self.users.get(user_id).await? {
            Some(user) => user,
            None => return Ok(Vec::new()),
        };

        if !user.memory_window_open(now) {
            debug!(user_id = user_id, "Memory window closed, returning no history");
            return Ok(Vec::new());
        }

        self.messages.for_user(user_id).await
    }
}
