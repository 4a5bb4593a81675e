//! Per-message orchestrator: ledger → sweep → quota → transcription →
//! history → prompt → model call → persistence → reply.

use std::sync::Arc;

use chrono::Utc;
use llm_client::{CompletionRequest, LlmClient, SpeechToText};
use prompt::{compose, ChatMessage, Classifier, MessageRole};
use quota::{Admission, MessageKind, ModelTier, QuotaPolicy};
use solace_core::{Bot, BotError, IncomingMessage, Result};
use storage::{ConversationStore, RetentionSweeper, UserRepository};
use tracing::{error, info, instrument, warn};

use crate::replies;

/// Concrete model names for the two quota tiers.
#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub premium: String,
    pub standard: String,
}

/// Sequences the quota, memory, and model collaborators for each inbound
/// message. All failures are absorbed in [`MessageHandler::handle`]; the
/// polling loop never sees an error.
pub struct MessageHandler {
    users: UserRepository,
    conversations: ConversationStore,
    sweeper: RetentionSweeper,
    policy: QuotaPolicy,
    classifier: Classifier,
    llm: Arc<dyn LlmClient>,
    stt: Arc<dyn SpeechToText>,
    bot: Arc<dyn Bot>,
    models: ModelSelection,
    admin_id: Option<i64>,
}

impl MessageHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: UserRepository,
        conversations: ConversationStore,
        sweeper: RetentionSweeper,
        policy: QuotaPolicy,
        classifier: Classifier,
        llm: Arc<dyn LlmClient>,
        stt: Arc<dyn SpeechToText>,
        bot: Arc<dyn Bot>,
        models: ModelSelection,
        admin_id: Option<i64>,
    ) -> Self {
        Self {
            users,
            conversations,
            sweeper,
            policy,
            classifier,
            llm,
            stt,
            bot,
            models,
            admin_id,
        }
    }

    /// Handles one message, absorbing any failure: the user gets a generic
    /// apology, the admin gets the detail, the loop lives on.
    #[instrument(skip(self, message), fields(user_id = message.user_id))]
    pub async fn handle(&self, message: &IncomingMessage) {
        if let Err(e) = self.process(message).await {
            error!(user_id = message.user_id, error = %e, "Message handling failed");
            if let Err(send_err) = self
                .bot
                .send_message(message.chat_id, replies::GENERIC_APOLOGY)
                .await
            {
                error!(user_id = message.user_id, error = %send_err, "Failed to send apology");
            }
            self.notify_admin(message.user_id, &e).await;
        }
    }

    /// Handles /start: registers the user, sweeps, greets with the keyboard.
    #[instrument(skip(self, message), fields(user_id = message.user_id))]
    pub async fn handle_start(&self, message: &IncomingMessage) {
        let now = Utc::now();
        if let Err(e) = self.users.get_or_create(message.user_id, now).await {
            error!(user_id = message.user_id, error = %e, "Failed to register user on /start");
        }
        self.sweep_opportunistically().await;

        if let Err(e) = self
            .bot
            .send_with_start_keyboard(message.chat_id, replies::random_greeting())
            .await
        {
            error!(user_id = message.user_id, error = %e, "Failed to send greeting");
        }
    }

    async fn process(&self, message: &IncomingMessage) -> Result<()> {
        let now = Utc::now();
        let user_id = message.user_id;

        self.users
            .get_or_create(user_id, now)
            .await
            .map_err(|e| BotError::Database(e.to_string()))?;
        self.sweep_opportunistically().await;

        if self.admin_id == Some(user_id) {
            info!(user_id = user_id, text = ?message.text, "Admin message");
        }

        let kind = match &message.voice {
            Some(voice) => MessageKind::Voice {
                minutes: voice.minutes(),
            },
            None => MessageKind::Text,
        };

        let admission = self
            .policy
            .admit(user_id, &kind, now)
            .await
            .map_err(|e| BotError::Database(e.to_string()))?;

        let (tier, throttle) = match admission {
            Admission::UpgradeRequired => {
                info!(user_id = user_id, "Rejected: free trial exhausted");
                return self.bot.send_message(message.chat_id, replies::FREE_LIMIT_REACHED).await;
            }
            Admission::DailyLimitReached { delay } => {
                info!(user_id = user_id, delay_secs = delay.as_secs(), "Rejected: daily cap");
                tokio::time::sleep(delay).await;
                return self.bot.send_message(message.chat_id, replies::DAILY_LIMIT_REACHED).await;
            }
            Admission::VoiceLimitReached => {
                info!(user_id = user_id, "Rejected: voice minutes exhausted");
                return self.bot.send_message(message.chat_id, replies::VOICE_LIMIT_REACHED).await;
            }
            Admission::Granted { tier, delay } => (tier, delay),
        };

        let user_text = match &message.voice {
            Some(voice) => {
                let audio = self.bot.download_voice(&voice.file_id).await?;
                let text = self
                    .stt
                    .transcribe(audio, "voice.ogg")
                    .await
                    .map_err(|e| BotError::Transcription(e.to_string()))?;
                if text.trim().is_empty() {
                    info!(user_id = user_id, "Empty transcription");
                    return self
                        .bot
                        .send_message(message.chat_id, replies::TRANSCRIPTION_EMPTY)
                        .await;
                }
                text
            }
            None => message.text.clone().unwrap_or_default(),
        };
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return self.bot.send_message(message.chat_id, replies::EMPTY_INPUT).await;
        }

        let history: Vec<ChatMessage> = self
            .conversations
            .history(user_id, now)
            .await
            .map_err(|e| BotError::Database(e.to_string()))?
            .into_iter()
            .map(|m| ChatMessage {
                role: MessageRole::parse(&m.role),
                content: m.content,
            })
            .collect();

        let composed = compose(user_text, &history, &self.classifier);
        let model = self.resolve_model(tier, composed.detailed);

        info!(
            user_id = user_id,
            model = %model,
            detailed = composed.detailed,
            history_len = history.len(),
            "Prompt composed"
        );

        if let Some(delay) = throttle {
            tokio::time::sleep(delay).await;
        }

        self.conversations
            .append(user_id, MessageRole::User.as_str(), user_text, now)
            .await
            .map_err(|e| BotError::Database(e.to_string()))?;

        let reply = self
            .llm
            .complete(CompletionRequest {
                model: model.to_string(),
                messages: composed.messages,
                max_tokens: composed.max_tokens,
                temperature: composed.temperature,
            })
            .await
            .map_err(|e| BotError::Model(e.to_string()))?;

        self.conversations
            .append(user_id, MessageRole::Assistant.as_str(), &reply, Utc::now())
            .await
            .map_err(|e| BotError::Database(e.to_string()))?;

        self.bot.send_message(message.chat_id, &reply).await
    }

    /// Detail requests always run on the premium model, whatever the
    /// daily-volume tier picked.
    fn resolve_model(&self, tier: ModelTier, detailed: bool) -> &str {
        if detailed {
            return &self.models.premium;
        }
        match tier {
            ModelTier::Premium => &self.models.premium,
            ModelTier::Standard => &self.models.standard,
        }
    }

    /// Runs the sweep inline; a sweep failure never fails the message.
    async fn sweep_opportunistically(&self) {
        match self.sweeper.sweep(Utc::now()).await {
            Ok(outcome) if outcome.purged > 0 || outcome.failed > 0 => {
                info!(purged = outcome.purged, failed = outcome.failed, "Retention sweep");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Retention sweep failed"),
        }
    }

    async fn notify_admin(&self, user_id: i64, err: &BotError) {
        let Some(admin_id) = self.admin_id else {
            return;
        };
        let text = format!(
            "⚠ Сбой при обработке сообщения пользователя {}: {}",
            user_id, err
        );
        if let Err(e) = self.bot.send_message(admin_id, &text).await {
            error!(error = %e, "Failed to notify admin");
        }
    }
}
