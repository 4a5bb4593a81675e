//! # solace-bot
//!
//! The runnable support-companion bot: env configuration, component
//! assembly, the per-message orchestrator, canned reply texts, and the
//! Telegram adapter + long-polling runner.

pub mod cli;
pub mod components;
pub mod config;
pub mod handler;
pub mod replies;
pub mod telegram;

pub use cli::{Cli, Commands};
pub use components::{build_components, BotComponents};
pub use config::BotConfig;
pub use handler::MessageHandler;
pub use telegram::run_bot;
