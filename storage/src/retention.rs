//! Retention sweeper: purges users (and their messages) past their deadline.

use crate::error::StorageError;
use crate::message_repo::MessageRepository;
use crate::user_repo::UserRepository;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

/// Days after subscription lapse during which data (and history visibility)
/// is still retained.
pub const SUBSCRIPTION_GRACE_DAYS: i64 = 14;

/// Days of inactivity after which a never-subscribed user is purged.
pub const INACTIVE_RETENTION_DAYS: i64 = 30;

/// Result of one sweep pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    pub purged: usize,
    pub failed: usize,
}

/// Scans the ledger and deletes expired users, messages first so an orphaned
/// message is never observable. Idempotent; safe to run on every request.
#[derive(Clone)]
pub struct RetentionSweeper {
    users: UserRepository,
    messages: MessageRepository,
}

impl RetentionSweeper {
    pub fn new(users: UserRepository, messages: MessageRepository) -> Self {
        Self { users, messages }
    }

    /// Runs one sweep. A failure while purging one user is logged and
    /// skipped; the remaining users are still processed.
    #[instrument(skip(self))]
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepOutcome, StorageError> {
        let mut outcome = SweepOutcome::default();

        for user in self.users.all_users().await? {
            let expired = match user.subscription_end {
                Some(end) => now > end + Duration::days(SUBSCRIPTION_GRACE_DAYS),
                None => now > user.last_seen + Duration::days(INACTIVE_RETENTION_DAYS),
            };
            if !expired {
                continue;
            }

            match self.purge(user.user_id).await {
                Ok(()) => {
                    info!(user_id = user.user_id, "Purged expired user data");
                    outcome.purged += 1;
                }
                Err(e) => {
                    warn!(
                        user_id = user.user_id,
                        error = %e,
                        "Failed to purge user, continuing sweep"
                    );
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }

    async fn purge(&self, user_id: i64) -> Result<(), StorageError> {
        self.messages.delete_for_user(user_id).await?;
        self.users.delete(user_id).await?;
        Ok(())
    }
}
