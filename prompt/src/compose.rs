//! Ordered assembly of instruction blocks, history, and the user turn.
//!
//! Blocks are appended by name in one fixed priority order; nothing is
//! inserted by position.

use crate::classify::Classifier;
use crate::ChatMessage;

/// Base persona: a warm, attentive female consultant.
const PERSONA: &str = "\
Ты — чуткая женщина-психолог, консультант проекта «Я больше не жду».
Отвечаешь всегда от первого лица в женском роде, как тёплая, понимающая подруга.
Твоя задача — присутствовать рядом, слышать боль и давать опоры.
Не торопишься с советами; сначала отражаешь чувства клиента.
Избегай фраз вроде «всё наладится», «просто отпусти».
Не ставь диагнозы и не спорь с опытом клиента.
Если текст клиента по-английски — отвечай по-английски.
Если есть риск самоповреждения — мягко советуй обратиться к службам поддержки.";

/// Always applied: human tone with light structure.
const CONVERSATIONAL_TONE: &str = "\
Отвечай как живой человек, тепло и без канцелярита. Короткие абзацы.
Допускаются мягкие метафоры, но по делу. В конце помогай обозначить
следующий шаг: один-два мягких вопроса.";

/// Domain knowledge for breakup/ex-partner conversations.
const RELATIONSHIP_GUIDE: &str = "\
Контекст: клиентка переживает разрыв или сложные отношения.
Опирайся на практику восстановления после расставания: правило «не писать
первой», возвращение фокуса на собственную жизнь, бережное проживание
злости и тоски. Не обесценивай привязанность и не подталкивай ни к
возвращению, ни к разрыву — помогай увидеть её собственные потребности.";

/// Structured template for detailed answers.
const DEEP_ANALYSIS: &str = "\
Разбери ситуацию по шагам:
1) что произошло — фактами, без оценок;
2) какие чувства это поднимает;
3) какие мотивы могут стоять за поведением другого человека;
4) на что клиентка может опереться прямо сейчас;
5) один маленький следующий шаг.";

/// Offer concrete phrasings when the user asks what to say.
const REPLY_VARIANTS: &str = "\
Предложи 2–3 варианта формулировки: короткий нейтральный, тёплый и
сдержанно-дистанцированный. Объясни одной строкой, чем они отличаются.";

const MAX_TOKENS_DETAILED: u32 = 1500;
const MAX_TOKENS_BRIEF: u32 = 500;
const TEMPERATURE_DETAILED: f32 = 0.7;
const TEMPERATURE_BRIEF: f32 = 0.6;

/// Named instruction blocks, in their assembly priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Persona,
    ConversationalTone,
    RelationshipGuide,
    DeepAnalysis,
    ReplyVariants,
}

impl BlockKind {
    pub fn text(&self) -> &'static str {
        match self {
            BlockKind::Persona => PERSONA,
            BlockKind::ConversationalTone => CONVERSATIONAL_TONE,
            BlockKind::RelationshipGuide => RELATIONSHIP_GUIDE,
            BlockKind::DeepAnalysis => DEEP_ANALYSIS,
            BlockKind::ReplyVariants => REPLY_VARIANTS,
        }
    }
}

/// The assembled model call: instruction blocks (by name, for inspection),
/// the full message list, and generation parameters.
#[derive(Debug, Clone)]
pub struct ComposedPrompt {
    pub blocks: Vec<BlockKind>,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Detail requests always run on the higher-quality model, overriding
    /// the daily-volume tier.
    pub detailed: bool,
}

/// Builds the ordered message list for one model call.
///
/// Order: persona, tone, relationship guide (topic-gated), deep-analysis
/// template (detail- or topic-gated), reply variants (request-gated), then
/// the conversation history, then the user turn.
pub fn compose(user_text: &str, history: &[ChatMessage], classifier: &Classifier) -> ComposedPrompt {
    let detailed = classifier.is_detailed(user_text, history);
    let relationship = classifier.is_relationship_topic(user_text);

    let mut blocks = vec![BlockKind::Persona, BlockKind::ConversationalTone];
    if relationship {
        blocks.push(BlockKind::RelationshipGuide);
    }
    if detailed || relationship {
        blocks.push(BlockKind::DeepAnalysis);
    }
    if classifier.needs_variants(user_text) {
        blocks.push(BlockKind::ReplyVariants);
    }

    let mut messages: Vec<ChatMessage> = blocks
        .iter()
        .map(|b| ChatMessage::system(b.text()))
        .collect();
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(user_text));

    let (max_tokens, temperature) = if detailed {
        (MAX_TOKENS_DETAILED, TEMPERATURE_DETAILED)
    } else {
        (MAX_TOKENS_BRIEF, TEMPERATURE_BRIEF)
    };

    ComposedPrompt {
        blocks,
        messages,
        max_tokens,
        temperature,
        detailed,
    }
}
