//! # solace-core
//!
//! Core types and traits for the support-companion bot: the [`Bot`] transport seam,
//! inbound message types, error types, and tracing initialization.
//! Transport-agnostic except for the teloxide-backed [`TelegramBot`] implementation.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::{Bot, TelegramBot};
pub use error::{BotError, Result};
pub use logger::init_tracing;
pub use types::{IncomingMessage, VoiceRef};
