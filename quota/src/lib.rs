//! # Quota policy
//!
//! Per-message admission control over the user ledger: lifetime free trial,
//! rolling daily cap with model-tier degradation, and the daily voice-minute
//! limit. One entry point, [`QuotaPolicy::admit`], returns a terminal
//! [`Admission`] outcome; the orchestrator acts on it and never re-derives
//! quota state itself.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;
use storage::{StorageError, UserRepository};
use tracing::{debug, instrument};

/// Model quality tier selected by the daily-volume policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Cheaper/faster model for heavy same-day usage.
    Standard,
    /// Default higher-quality model.
    Premium,
}

/// Kind of inbound message, as far as quotas are concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    Text,
    Voice { minutes: f64 },
}

/// Terminal outcome of admission. Rejections carry the user-facing reason;
/// the daily-cap rejection also carries the backoff the caller must sleep
/// before answering.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Granted {
        tier: ModelTier,
        /// Throttle applied before the model call when the user is in the
        /// degraded tier band.
        delay: Option<Duration>,
    },
    /// Free trial exhausted and no active subscription.
    UpgradeRequired,
    /// Rolling 24h message cap reached.
    DailyLimitReached { delay: Duration },
    /// Daily voice minutes exhausted (text still allowed).
    VoiceLimitReached,
}

/// Limits governing admission. Defaults are the production values.
#[derive(Debug, Clone)]
pub struct QuotaLimits {
    /// Hard daily message cap (post-increment count at which we reject).
    pub daily_cap: i64,
    /// Post-increment count at which the standard tier + throttle kicks in.
    pub throttle_threshold: i64,
    /// Voice minutes allowed per rolling day.
    pub voice_minutes_per_day: f64,
    /// Backoff range (seconds) for the daily-cap rejection.
    pub reject_backoff_secs: RangeInclusive<u64>,
    /// Throttle range (seconds) for the degraded tier.
    pub throttle_secs: RangeInclusive<u64>,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            daily_cap: 100,
            throttle_threshold: 50,
            voice_minutes_per_day: 20.0,
            reject_backoff_secs: 5..=10,
            throttle_secs: 3..=5,
        }
    }
}

/// Admission state machine over the user ledger.
#[derive(Clone)]
pub struct QuotaPolicy {
    users: UserRepository,
    limits: QuotaLimits,
}

impl QuotaPolicy {
    pub fn new(users: UserRepository) -> Self {
        Self {
            users,
            limits: QuotaLimits::default(),
        }
    }

    pub fn with_limits(users: UserRepository, limits: QuotaLimits) -> Self {
        Self { users, limits }
    }

    /// Decides whether the message may proceed and on which model tier,
    /// mutating the ledger counters along the way. Evaluation order, first
    /// terminal outcome wins:
    ///
    /// 1. no subscription and no free messages left → `UpgradeRequired`
    ///    (nothing mutated);
    /// 2. free messages remain and no subscription → spend one;
    /// 3. daily counter incremented; post-increment count at the cap →
    ///    `DailyLimitReached` with a sampled backoff;
    /// 4. voice only: voice minutes exhausted → `VoiceLimitReached`
    ///    (counters from 1–3 stay spent), otherwise the duration is added;
    /// 5. count at or past the throttle threshold → `Standard` tier with a
    ///    small sampled delay, else `Premium` with none.
    ///
    /// The caller must have run `get_or_create` for the user beforehand.
    #[instrument(skip(self))]
    pub async fn admit(
        &self,
        user_id: i64,
        kind: &MessageKind,
        now: DateTime<Utc>,
    ) -> Result<Admission, StorageError> {
        self.users.reset_daily_if_stale(user_id, now).await?;

        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("user {}", user_id)))?;

        let subscribed = user.has_active_subscription(now);

        if !subscribed && !user.can_send_free() {
            debug!(user_id = user_id, "Free trial exhausted, upgrade required");
            return Ok(Admission::UpgradeRequired);
        }
        if !subscribed {
            self.users.decrement_free(user_id).await?;
        }

        let daily = self.users.increment_daily(user_id).await?;
        if daily >= self.limits.daily_cap {
            debug!(user_id = user_id, daily = daily, "Daily cap reached");
            return Ok(Admission::DailyLimitReached {
                delay: sample_delay(self.limits.reject_backoff_secs.clone()),
            });
        }

        if let MessageKind::Voice { minutes } = kind {
            let under_limit = self
                .users
                .check_and_reset_voice_limit(user_id, now, self.limits.voice_minutes_per_day)
                .await?;
            if !under_limit {
                debug!(user_id = user_id, "Voice minutes exhausted");
                return Ok(Admission::VoiceLimitReached);
            }
            self.users.add_voice_minutes(user_id, *minutes).await?;
        }

        if daily >= self.limits.throttle_threshold {
            Ok(Admission::Granted {
                tier: ModelTier::Standard,
                delay: Some(sample_delay(self.limits.throttle_secs.clone())),
            })
        } else {
            Ok(Admission::Granted {
                tier: ModelTier::Premium,
                delay: None,
            })
        }
    }
}

fn sample_delay(range: RangeInclusive<u64>) -> Duration {
    Duration::from_secs(rand::thread_rng().gen_range(range))
}
