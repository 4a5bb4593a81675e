//! Canned user-facing texts: quota rejections, input errors, the generic
//! apology, and the /start greeting pool.

use rand::seq::SliceRandom;

pub const FREE_LIMIT_REACHED: &str =
    "🔒 Лимит бесплатных сообщений исчерпан. Оформи подписку, чтобы продолжить.";

pub const DAILY_LIMIT_REACHED: &str =
    "⏳ Лимит 100 сообщений в день. Пожалуйста, подожди немного.";

pub const VOICE_LIMIT_REACHED: &str =
    "🎙 Лимит голосовых сообщений на сегодня исчерпан. Пиши текстом.";

pub const TRANSCRIPTION_EMPTY: &str =
    "Кажется, я не расслышала тебя. Попробуй ещё раз сказать или напиши словами.";

pub const EMPTY_INPUT: &str = "Отправь мне текст или голосовое сообщение.";

pub const GENERIC_APOLOGY: &str =
    "⚠ Что-то пошло не так. Попробуй, пожалуйста, ещё раз чуть позже.";

/// Greeting pool for /start; one is chosen at random.
pub const GREETINGS: &[&str] = &[
    "Даже если сейчас тяжело — ты можешь всё мне рассказать. Здесь нет осуждения.",
    "Я здесь, чтобы быть рядом. Можешь выложить всё, что носишь в себе.",
    "Если слова не идут — начни с любого. Я буду слушать и слышать.",
    "Тут можно говорить честно. Можно молчать. Я всё равно останусь рядом.",
    "Иногда достаточно, чтобы кто-то был рядом. Я готова быть этим человеком.",
    "Иногда слова не находятся… Иногда тишина говорит громче. Здесь можно просто быть — и тебя всё равно услышат.",
    "Это твоё личное пространство. Место, где можно выговориться или просто молчать, зная, что я рядом.",
    "Если тяжело подобрать слова — начни с молчания. Я всё равно почувствую тебя.",
    "Тут нет чужих глаз и лишних советов. Есть только мы — и место, где можно быть честной.",
    "Ты можешь рассказать всё, что носишь в себе. Или просто остаться в тишине. Я останусь рядом.",
    "Можешь сложить сюда усталость, боль и даже пустоту. Здесь их примут бережно.",
    "Неважно, сколько времени ты молчала… Я готова слушать сейчас.",
    "Это тихий уголок для честных слов. И даже для тех, что не произносятся.",
    "Иногда достаточно одного взгляда, чтобы понять. Здесь я — тот самый взгляд.",
    "Ты можешь быть здесь настоящей. И в этом нет ничего страшного.",
    "Я рядом, даже если ты не знаешь, с чего начать.",
    "Тут можно оставаться собой без страха и ожиданий.",
    "В этом месте нет правил. Только твоё право говорить или молчать.",
    "Можно просто быть. Без объяснений. И я останусь здесь.",
    "Ты в безопасности, пока мы здесь. Всё остальное подождёт.",
];

/// Picks a random greeting for /start.
pub fn random_greeting() -> &'static str {
    GREETINGS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(GREETINGS[0])
}
