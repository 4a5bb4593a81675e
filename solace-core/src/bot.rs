//! Bot abstraction for sending replies and fetching voice audio.
//!
//! [`Bot`] trait is transport-agnostic; [`TelegramBot`] implements it via teloxide.

use crate::error::{BotError, Result};
use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup};

/// Abstraction over the chat transport. Implementations map to a concrete
/// messenger; the message handler only ever talks through this trait.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a plain text message to the given chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
    /// Sends a message together with the one-button start keyboard.
    async fn send_with_start_keyboard(&self, chat_id: i64, text: &str) -> Result<()>;
    /// Downloads the raw audio bytes of a voice attachment.
    async fn download_voice(&self, file_id: &str) -> Result<Vec<u8>>;
}

/// Teloxide-based implementation of [`Bot`].
pub struct TelegramBot {
    bot: teloxide::Bot,
}

impl TelegramBot {
    /// Creates a bot using the given Telegram bot token.
    pub fn new(token: String) -> Self {
        Self {
            bot: teloxide::Bot::new(token),
        }
    }

    /// Wraps an already-built teloxide bot (shared with the polling runner).
    pub fn with_bot(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Bot for TelegramBot {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map_err(|e| BotError::Bot(e.to_string()))?;
        Ok(())
    }

    async fn send_with_start_keyboard(&self, chat_id: i64, text: &str) -> Result<()> {
        let keyboard =
            KeyboardMarkup::new([[KeyboardButton::new("Начать")]]).resize_keyboard(true);
        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_markup(keyboard)
            .await
            .map_err(|e| BotError::Bot(e.to_string()))?;
        Ok(())
    }

    async fn download_voice(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self
            .bot
            .get_file(file_id)
            .await
            .map_err(|e| BotError::Bot(e.to_string()))?;
        let mut audio = std::io::Cursor::new(Vec::new());
        self.bot
            .download_file(&file.path, &mut audio)
            .await
            .map_err(|e| BotError::Bot(e.to_string()))?;
        Ok(audio.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_bot_new() {
        let _bot = TelegramBot::new("dummy_token".to_string());
    }
}
