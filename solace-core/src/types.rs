//! Inbound message types delivered by the chat transport.

use serde::{Deserialize, Serialize};

/// One inbound update from the chat transport: who sent it, where to answer,
/// and either text or a voice attachment (or both absent for unsupported kinds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub user_id: i64,
    pub chat_id: i64,
    pub text: Option<String>,
    pub voice: Option<VoiceRef>,
}

/// Reference to a voice attachment; the audio itself is fetched through the
/// transport ([`crate::Bot::download_voice`]) only after the message is admitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceRef {
    pub file_id: String,
    pub duration_seconds: u32,
}

impl VoiceRef {
    /// Duration in minutes, the unit the voice quota is counted in.
    pub fn minutes(&self) -> f64 {
        f64::from(self.duration_seconds) / 60.0
    }
}

impl IncomingMessage {
    pub fn is_voice(&self) -> bool {
        self.voice.is_some()
    }
}
