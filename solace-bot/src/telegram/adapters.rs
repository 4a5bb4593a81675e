//! Conversion from teloxide messages to the core inbound message type.

use solace_core::{IncomingMessage, VoiceRef};

/// Converts a teloxide message into the transport-agnostic inbound type.
/// Returns `None` for updates without a sender or without text/voice
/// content (stickers, photos, service messages).
pub fn to_incoming(msg: &teloxide::types::Message) -> Option<IncomingMessage> {
    let user = msg.from()?;

    let text = msg.text().map(str::to_string);
    let voice = msg.voice().map(|v| VoiceRef {
        file_id: v.file.id.clone(),
        duration_seconds: v.duration,
    });

    if text.is_none() && voice.is_none() {
        return None;
    }

    Some(IncomingMessage {
        user_id: user.id.0 as i64,
        chat_id: msg.chat.id.0,
        text,
        voice,
    })
}
