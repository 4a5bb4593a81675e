mod message_record;
mod user_record;

pub use message_record::MessageRecord;
pub use user_record::{UserRecord, DEFAULT_FREE_MESSAGES};
