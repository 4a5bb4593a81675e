//! Intent classification: case-insensitive keyword predicates over the
//! message text, driven entirely by enumerated keyword sets.

use crate::{ChatMessage, MessageRole};

/// Keyword sets and thresholds for classification. Defaults are the
/// production Russian sets; tests may substitute smaller ones.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Explicit "give me detail" trigger phrases.
    pub detail_triggers: Vec<String>,
    /// Topic/complexity keywords that imply a detailed answer is wanted.
    pub complexity_keywords: Vec<String>,
    /// "What should I say/write" trigger phrases.
    pub variant_triggers: Vec<String>,
    /// Breakup/ex-partner/no-contact vocabulary.
    pub relationship_keywords: Vec<String>,
    /// "That didn't help, try differently" signals in recent user turns.
    pub retry_signals: Vec<String>,
    /// Message length (chars) beyond which detail is assumed.
    pub auto_detail_min_chars: usize,
    /// Question-mark count at which detail is assumed.
    pub auto_detail_min_questions: usize,
    /// How many recent user turns are scanned for retry signals.
    pub retry_scan_window: usize,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            detail_triggers: owned(&[
                "подробно",
                "подробнее",
                "детально",
                "разложи по полочкам",
                "полный разбор",
                "разбери ситуацию",
                "объясни глубже",
            ]),
            complexity_keywords: owned(&[
                "что делать",
                "как поступить",
                "как мне быть",
                "стоит ли",
                "манипул",
                "газлайт",
                "абьюз",
                "не могу решить",
                "запуталась",
                "запутался",
            ]),
            variant_triggers: owned(&[
                "что ему написать",
                "что ей написать",
                "что написать",
                "что сказать",
                "что ответить",
                "как ответить",
                "помоги сформулировать",
                "напиши за меня",
                "варианты ответа",
            ]),
            relationship_keywords: owned(&[
                "бывший",
                "бывшего",
                "бывшему",
                "расстались",
                "расставание",
                "разрыв",
                "не пишет",
                "написал",
                "не звонит",
                "игнорит",
                "вернуть его",
                "забыть его",
                "он ушел",
                "он ушёл",
                "новая девушка",
            ]),
            retry_signals: owned(&[
                "не помогло",
                "не то",
                "попробуй иначе",
                "попробуй по-другому",
                "ты не понял",
                "ты не поняла",
                "не об этом",
            ]),
            auto_detail_min_chars: 600,
            auto_detail_min_questions: 2,
            retry_scan_window: 6,
        }
    }
}

/// Plain predicate functions over one message plus its recent history.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

fn contains_any(text_lower: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text_lower.contains(k.as_str()))
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// The user asked for detail in so many words.
    pub fn wants_detailed_explicit(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.config.detail_triggers)
    }

    /// Detail is implied: a long message, several questions, a heavy topic,
    /// or a recent "that didn't help" signal.
    pub fn wants_detailed_auto(&self, text: &str, history: &[ChatMessage]) -> bool {
        let lower = text.to_lowercase();
        text.chars().count() > self.config.auto_detail_min_chars
            || text.matches('?').count() >= self.config.auto_detail_min_questions
            || contains_any(&lower, &self.config.complexity_keywords)
            || self.recent_retry_signal(history)
    }

    /// Whether this message should get a detailed, structured answer.
    pub fn is_detailed(&self, text: &str, history: &[ChatMessage]) -> bool {
        self.wants_detailed_explicit(text) || self.wants_detailed_auto(text, history)
    }

    /// The user is asking for concrete phrasings to send someone.
    pub fn needs_variants(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.config.variant_triggers)
    }

    /// Breakup/ex-partner territory.
    pub fn is_relationship_topic(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.config.relationship_keywords)
    }

    fn recent_retry_signal(&self, history: &[ChatMessage]) -> bool {
        history
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::User)
            .take(self.config.retry_scan_window)
            .any(|m| contains_any(&m.content.to_lowercase(), &self.config.retry_signals))
    }
}
