//! Storage crate: user ledger, conversation log, and data-retention sweep.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – UserRecord, MessageRecord
//! - [`user_repo`] – UserRepository (per-user counters and timestamps)
//! - [`message_repo`] – MessageRepository (append-only message log)
//! - [`conversation`] – ConversationStore (retention-gated history)
//! - [`retention`] – RetentionSweeper (expired-data purge)
//! - [`sqlite_pool`] – SqlitePoolManager

mod conversation;
mod error;
mod message_repo;
mod models;
mod retention;
mod sqlite_pool;
mod user_repo;

pub use conversation::ConversationStore;
pub use error::StorageError;
pub use message_repo::MessageRepository;
pub use models::{MessageRecord, UserRecord, DEFAULT_FREE_MESSAGES};
pub use retention::{
    RetentionSweeper, SweepOutcome, INACTIVE_RETENTION_DAYS, SUBSCRIPTION_GRACE_DAYS,
};
pub use sqlite_pool::SqlitePoolManager;
pub use user_repo::{UserRepository, UNLIMITED_FREE_MESSAGES};
