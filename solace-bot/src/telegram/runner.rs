//! Polling runner: converts teloxide messages to core messages and hands
//! them to the MessageHandler. Each message is handled in a spawned task so
//! the poll loop never blocks on storage or model calls.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, instrument, warn};

use crate::components::{build_components, BotComponents};
use crate::config::BotConfig;
use crate::handler::MessageHandler;
use crate::telegram::to_incoming;
use solace_core::init_tracing;

/// Main entry: init logging, build components, run one startup sweep, then
/// start long polling.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    std::fs::create_dir_all("logs")?;
    init_tracing(config.log_file.as_str())?;

    info!(database_url = %config.database_url, "Initializing bot");

    let BotComponents {
        handler,
        teloxide_bot,
        sweeper,
        ..
    } = build_components(&config, None).await?;

    // One full sweep before accepting traffic.
    match sweeper.sweep(Utc::now()).await {
        Ok(outcome) => info!(purged = outcome.purged, "Startup retention sweep"),
        Err(e) => warn!(error = %e, "Startup retention sweep failed"),
    }

    info!("Bot started successfully");
    run_repl(teloxide_bot, handler).await
}

/// Starts the REPL with the given teloxide Bot and handler. `/start` gets
/// the greeting flow; everything else goes through the full pipeline.
pub async fn run_repl(bot: teloxide::Bot, handler: Arc<MessageHandler>) -> Result<()> {
    teloxide::repl(bot, move |_bot: Bot, msg: teloxide::types::Message| {
        let handler = handler.clone();

        async move {
            let Some(incoming) = to_incoming(&msg) else {
                info!(chat_id = msg.chat.id.0, "Ignoring unsupported message kind");
                return Ok(());
            };

            info!(
                user_id = incoming.user_id,
                chat_id = incoming.chat_id,
                is_voice = incoming.is_voice(),
                "Received message"
            );

            let is_start = incoming.text.as_deref() == Some("/start");

            // Handle in a spawned task so the poll loop returns immediately.
            tokio::spawn(async move {
                if is_start {
                    handler.handle_start(&incoming).await;
                } else {
                    handler.handle(&incoming).await;
                }
            });

            Ok(())
        }
    })
    .await;

    Ok(())
}
