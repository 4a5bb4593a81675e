//! Bot configuration, loaded from environment variables.

use anyhow::{anyhow, Result};
use std::env;

pub struct BotConfig {
    pub bot_token: String,
    pub database_url: String,
    pub log_file: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    /// Default, higher-quality model tier.
    pub model_premium: String,
    /// Cheaper model used under heavy same-day usage.
    pub model_standard: String,
    pub transcription_model: String,
    /// Privileged identity: receives failure reports and unlimited quota.
    pub admin_id: Option<i64>,
    pub completion_timeout_secs: u64,
    pub transcription_timeout_secs: u64,
}

impl BotConfig {
    /// Loads configuration from environment variables.
    /// If `token` is given it overrides `BOT_TOKEN`.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(t) => t,
            None => env::var("BOT_TOKEN").map_err(|_| anyhow!("BOT_TOKEN not set"))?,
        };
        let openai_api_key =
            env::var("OPENAI_API_KEY").map_err(|_| anyhow!("OPENAI_API_KEY not set"))?;
        let openai_base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "./solace.db".to_string());
        let log_file = "logs/solace-bot.log".to_string();
        let model_premium =
            env::var("MODEL_PREMIUM").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let model_standard =
            env::var("MODEL_STANDARD").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
        let transcription_model = env::var("TRANSCRIPTION_MODEL")
            .unwrap_or_else(|_| "gpt-4o-mini-transcribe".to_string());
        let admin_id = env::var("ADMIN_ID").ok().and_then(|s| s.parse().ok());
        let completion_timeout_secs = env::var("COMPLETION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        let transcription_timeout_secs = env::var("TRANSCRIPTION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            bot_token,
            database_url,
            log_file,
            openai_api_key,
            openai_base_url,
            model_premium,
            model_standard,
            transcription_model,
            admin_id,
            completion_timeout_secs,
            transcription_timeout_secs,
        })
    }

    /// Rejects configurations that cannot work at all.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            return Err(anyhow!("BOT_TOKEN is empty"));
        }
        if self.openai_api_key.trim().is_empty() {
            return Err(anyhow!("OPENAI_API_KEY is empty"));
        }
        if self.model_premium.trim().is_empty() || self.model_standard.trim().is_empty() {
            return Err(anyhow!("model names must not be empty"));
        }
        Ok(())
    }
}

/// Loads and validates config; the CLI entry point.
pub fn load_config(token: Option<String>) -> Result<BotConfig> {
    let config = BotConfig::load(token)?;
    config.validate()?;
    Ok(config)
}
