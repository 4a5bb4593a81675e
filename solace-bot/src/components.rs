//! Component factory: builds repositories, policy, clients, and the message
//! handler from config. Isolates assembly logic from the runner.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use llm_client::{LlmClient, OpenAiClient, SpeechToText};
use prompt::Classifier;
use quota::QuotaPolicy;
use solace_core::{Bot, TelegramBot};
use storage::{
    ConversationStore, MessageRepository, RetentionSweeper, SqlitePoolManager, UserRepository,
};
use tracing::{error, info, instrument};

use crate::config::BotConfig;
use crate::handler::{MessageHandler, ModelSelection};

/// Days of subscription granted to the admin identity at startup.
const ADMIN_GRANT_DAYS: i64 = 3650;

/// Core dependencies for the runner; produced by the component factory.
pub struct BotComponents {
    pub handler: Arc<MessageHandler>,
    pub teloxide_bot: teloxide::Bot,
    pub sweeper: RetentionSweeper,
    pub users: UserRepository,
}

/// Builds all components. The optional `bot_override` lets tests inject a
/// mock transport; production passes `None` and gets the teloxide-backed bot.
#[instrument(skip(config, bot_override))]
pub async fn build_components(
    config: &BotConfig,
    bot_override: Option<Arc<dyn Bot>>,
) -> Result<BotComponents> {
    let pool = SqlitePoolManager::new(&config.database_url)
        .await
        .map_err(|e| {
            error!(error = %e, database_url = %config.database_url, "Failed to open database");
            anyhow::anyhow!("Failed to open database: {}", e)
        })?;

    let users = UserRepository::new(pool.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize user storage: {}", e))?;
    let messages = MessageRepository::new(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize message storage: {}", e))?;

    let conversations = ConversationStore::new(users.clone(), messages.clone());
    let sweeper = RetentionSweeper::new(users.clone(), messages);
    let policy = QuotaPolicy::new(users.clone());

    let teloxide_bot = teloxide::Bot::new(config.bot_token.clone());
    let bot: Arc<dyn Bot> = match bot_override {
        Some(bot) => bot,
        None => Arc::new(TelegramBot::with_bot(teloxide_bot.clone())),
    };

    let openai = OpenAiClient::with_base_url(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    )
    .with_timeouts(
        Duration::from_secs(config.completion_timeout_secs),
        Duration::from_secs(config.transcription_timeout_secs),
    )
    .with_transcription_model(config.transcription_model.clone());
    let llm: Arc<dyn LlmClient> = Arc::new(openai.clone());
    let stt: Arc<dyn SpeechToText> = Arc::new(openai);

    if let Some(admin_id) = config.admin_id {
        users
            .grant_unlimited_access(admin_id, Utc::now(), ADMIN_GRANT_DAYS)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to grant admin access: {}", e))?;
        info!(admin_id = admin_id, "Granted unlimited access to admin");
    }

    let handler = Arc::new(MessageHandler::new(
        users.clone(),
        conversations,
        sweeper.clone(),
        policy,
        Classifier::default(),
        llm,
        stt,
        bot,
        ModelSelection {
            premium: config.model_premium.clone(),
            standard: config.model_standard.clone(),
        },
        config.admin_id,
    ));

    Ok(BotComponents {
        handler,
        teloxide_bot,
        sweeper,
        users,
    })
}
