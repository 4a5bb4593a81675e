//! User ledger row: counters and timestamps governing quotas and retention.
//!
//! Maps to the `users` table and is used by UserRepository.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::retention::SUBSCRIPTION_GRACE_DAYS;

/// Free messages granted to a user on first contact.
pub const DEFAULT_FREE_MESSAGES: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub user_id: i64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub free_messages: i64,
    pub subscription_end: Option<DateTime<Utc>>,
    pub voice_minutes_today: f64,
    pub last_voice_reset: Option<DateTime<Utc>>,
    pub daily_messages: i64,
    pub last_daily_reset: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Fresh record for a user seen for the first time at `now`.
    pub fn new(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            first_seen: now,
            last_seen: now,
            free_messages: DEFAULT_FREE_MESSAGES,
            subscription_end: None,
            voice_minutes_today: 0.0,
            last_voice_reset: Some(now),
            daily_messages: 0,
            last_daily_reset: Some(now),
        }
    }

    /// Strict entitlement check: a subscription exists and has not lapsed.
    /// The post-lapse grace window applies to conversation memory only,
    /// never to quota admission.
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        match self.subscription_end {
            Some(end) => now <= end,
            None => false,
        }
    }

    /// Whether conversation memory is still readable: subscribed, or lapsed
    /// less than the retention grace ago. Shares its boundary with the
    /// sweeper so history is never visible past the point it would be purged.
    pub fn memory_window_open(&self, now: DateTime<Utc>) -> bool {
        match self.subscription_end {
            Some(end) => now <= end + Duration::days(SUBSCRIPTION_GRACE_DAYS),
            None => false,
        }
    }

    /// Whether any free trial messages remain.
    pub fn can_send_free(&self) -> bool {
        self.free_messages > 0
    }
}
