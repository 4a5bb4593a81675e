//! # Prompt
//!
//! Builds the ordered message list for the chat model from the user's text
//! and the retained conversation history.
//!
//! ## Shape
//!
//! - **Classification** ([`classify`]): data-driven keyword predicates over
//!   the message text (detail requests, reply-variant requests, relationship
//!   topics), configured through [`ClassifierConfig`].
//! - **Assembly** ([`compose`]): named instruction blocks appended in a fixed
//!   priority order, then the history, then the user turn, plus the
//!   generation parameters for the call.
//!
//! Pure: no I/O, no side effects; feed literal strings and assert the
//! resulting block set and parameters.

mod classify;
mod compose;

pub use classify::{Classifier, ClassifierConfig};
pub use compose::{compose, BlockKind, ComposedPrompt};

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

impl MessageRole {
    /// Storage string for the role (matches the `messages.role` column).
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    /// Parses the storage string; unknown values fall back to `User`.
    pub fn parse(s: &str) -> MessageRole {
        match s {
            "system" => MessageRole::System,
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::User,
        }
    }
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}
