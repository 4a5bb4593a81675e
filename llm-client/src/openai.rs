//! OpenAI implementation of [`LlmClient`] and [`SpeechToText`] via async-openai.

use anyhow::{anyhow, Result};
use async_openai::types::{
    AudioInput, CreateChatCompletionRequestArgs, CreateTranscriptionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument};

use crate::{chat_message_to_openai, mask_token, CompletionRequest, LlmClient, SpeechToText};

const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_TRANSCRIPTION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TRANSCRIPTION_MODEL: &str = "gpt-4o-mini-transcribe";

/// OpenAI-backed chat completion and audio transcription client.
/// Single attempt per call, bounded by a timeout; failures surface as
/// opaque errors for the handler's apology path.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Arc<Client<async_openai::config::OpenAIConfig>>,
    /// API key stored only for logging (masked).
    api_key_for_logging: String,
    completion_timeout: Duration,
    transcription_timeout: Duration,
    transcription_model: String,
}

impl OpenAiClient {
    /// Builds a client using the given API key and default API base URL.
    pub fn new(api_key: String) -> Self {
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key.clone());
        Self {
            client: Arc::new(Client::with_config(config)),
            api_key_for_logging: api_key,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            transcription_timeout: DEFAULT_TRANSCRIPTION_TIMEOUT,
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
        }
    }

    /// Builds a client with a custom base URL (e.g. for proxies or compatible endpoints).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let config = async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key.clone())
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            api_key_for_logging: api_key,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            transcription_timeout: DEFAULT_TRANSCRIPTION_TIMEOUT,
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
        }
    }

    pub fn with_timeouts(mut self, completion: Duration, transcription: Duration) -> Self {
        self.completion_timeout = completion;
        self.transcription_timeout = transcription;
        self
    }

    pub fn with_transcription_model(mut self, model: String) -> Self {
        self.transcription_model = model;
        self
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let mut messages: Vec<async_openai::types::ChatCompletionRequestMessage> =
            Vec::with_capacity(request.messages.len());
        for msg in &request.messages {
            messages.push(chat_message_to_openai(msg)?);
        }

        info!(
            model = %request.model,
            message_count = messages.len(),
            max_tokens = request.max_tokens,
            temperature = request.temperature,
            api_key = %mask_token(&self.api_key_for_logging),
            "Chat completion request"
        );

        let api_request = CreateChatCompletionRequestArgs::default()
            .model(request.model.as_str())
            .messages(messages)
            .max_tokens(request.max_tokens)
            .temperature(request.temperature)
            .build()?;

        let response = timeout(self.completion_timeout, self.client.chat().create(api_request))
            .await
            .map_err(|_| {
                anyhow!(
                    "Chat completion timed out after {:?}",
                    self.completion_timeout
                )
            })??;

        if let Some(ref usage) = response.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Chat completion usage"
            );
        }

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow!("Chat completion response has no content"))
    }
}

#[async_trait]
impl SpeechToText for OpenAiClient {
    #[instrument(skip(self, audio))]
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String> {
        info!(
            model = %self.transcription_model,
            audio_bytes = audio.len(),
            api_key = %mask_token(&self.api_key_for_logging),
            "Transcription request"
        );

        let api_request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(filename.to_string(), audio))
            .model(self.transcription_model.as_str())
            .build()?;

        let response = timeout(
            self.transcription_timeout,
            self.client.audio().transcribe(api_request),
        )
        .await
        .map_err(|_| {
            anyhow!(
                "Transcription timed out after {:?}",
                self.transcription_timeout
            )
        })??;

        Ok(response.text.trim().to_string())
    }
}
