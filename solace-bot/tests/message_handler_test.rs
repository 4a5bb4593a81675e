//! Integration tests for [`solace_bot::MessageHandler`].
//!
//! Uses an in-memory SQLite ledger, a MockBot transport, and mock
//! LLM/transcription clients; no Telegram or OpenAI traffic. Throttle and
//! backoff ranges are pinned to zero so tests never sleep.

use anyhow::{anyhow, Result as AnyResult};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use llm_client::{CompletionRequest, LlmClient, SpeechToText};
use prompt::Classifier;
use quota::{QuotaLimits, QuotaPolicy};
use solace_bot::handler::{MessageHandler, ModelSelection};
use solace_bot::replies;
use solace_core::{Bot, IncomingMessage, Result as CoreResult, VoiceRef};
use storage::{
    ConversationStore, MessageRepository, RetentionSweeper, SqlitePoolManager, UserRepository,
};

/// Mock transport: records every outbound message, serves fixed voice bytes.
struct MockBot {
    sent: Mutex<Vec<(i64, String)>>,
}

impl MockBot {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_message(&self, chat_id: i64, text: &str) -> CoreResult<()> {
        self.sent.lock().expect("lock").push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_with_start_keyboard(&self, chat_id: i64, text: &str) -> CoreResult<()> {
        self.send_message(chat_id, text).await
    }

    async fn download_voice(&self, _file_id: &str) -> CoreResult<Vec<u8>> {
        Ok(vec![0u8; 16])
    }
}

/// Mock chat model: records requests; `reply = None` fails the call.
struct MockLlm {
    reply: Option<String>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, request: CompletionRequest) -> AnyResult<String> {
        self.calls.lock().expect("lock").push(request);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(anyhow!("model unavailable")),
        }
    }
}

/// Mock transcription: fixed text, counts invocations.
struct MockStt {
    text: String,
    calls: AtomicUsize,
}

impl MockStt {
    fn transcribing(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechToText for MockStt {
    async fn transcribe(&self, _audio: Vec<u8>, _filename: &str) -> AnyResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

struct Fixture {
    users: UserRepository,
    messages: MessageRepository,
    bot: Arc<MockBot>,
    llm: Arc<MockLlm>,
    stt: Arc<MockStt>,
    handler: MessageHandler,
}

/// Builds a handler over in-memory storage with zeroed delay ranges.
async fn fixture(llm: MockLlm, stt: MockStt, admin_id: Option<i64>) -> Fixture {
    let pool = SqlitePoolManager::new(":memory:")
        .await
        .expect("Failed to create pool");
    let users = UserRepository::new(pool.clone())
        .await
        .expect("Failed to create user repository");
    let messages = MessageRepository::new(pool)
        .await
        .expect("Failed to create message repository");
    let conversations = ConversationStore::new(users.clone(), messages.clone());
    let sweeper = RetentionSweeper::new(users.clone(), messages.clone());
    let limits = QuotaLimits {
        reject_backoff_secs: 0..=0,
        throttle_secs: 0..=0,
        ..QuotaLimits::default()
    };
    let policy = QuotaPolicy::with_limits(users.clone(), limits);

    let bot = Arc::new(MockBot::new());
    let llm = Arc::new(llm);
    let stt = Arc::new(stt);

    let handler = MessageHandler::new(
        users.clone(),
        conversations,
        sweeper,
        policy,
        Classifier::default(),
        llm.clone(),
        stt.clone(),
        bot.clone(),
        ModelSelection {
            premium: "gpt-4o-mini".to_string(),
            standard: "gpt-3.5-turbo".to_string(),
        },
        admin_id,
    );

    Fixture {
        users,
        messages,
        bot,
        llm,
        stt,
        handler,
    }
}

fn text_message(user_id: i64, text: &str) -> IncomingMessage {
    IncomingMessage {
        user_id,
        chat_id: user_id,
        text: Some(text.to_string()),
        voice: None,
    }
}

fn voice_message(user_id: i64, duration_seconds: u32) -> IncomingMessage {
    IncomingMessage {
        user_id,
        chat_id: user_id,
        text: None,
        voice: Some(VoiceRef {
            file_id: "voice-file".to_string(),
            duration_seconds,
        }),
    }
}

/// **Test: Normal text flow replies with the model output and persists both turns.**
///
/// **Setup:** Fresh user; model replying "я рядом".
/// **Action:** Handle one text message.
/// **Expected:** Reply sent; user and assistant turns stored; premium model used.
#[tokio::test]
async fn test_text_flow_replies_and_persists() {
    let f = fixture(MockLlm::replying("я рядом"), MockStt::transcribing(""), None).await;

    f.handler.handle(&text_message(1, "мне грустно")).await;

    let sent = f.bot.sent();
    assert_eq!(sent, vec![(1, "я рядом".to_string())]);

    let turns = f.messages.for_user(1).await.expect("Failed to load turns");
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, "user");
    assert_eq!(turns[0].content, "мне грустно");
    assert_eq!(turns[1].role, "assistant");
    assert_eq!(turns[1].content, "я рядом");

    let calls = f.llm.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, "gpt-4o-mini");
    assert_eq!(calls[0].max_tokens, 500);
}

/// **Test: 11th message of a trial user is rejected and the model is never called.**
///
/// **Setup:** Fresh user, no subscription; 10 accepted messages.
/// **Action:** Handle one more.
/// **Expected:** Upgrade-required reply; exactly 10 model calls total.
#[tokio::test]
async fn test_free_trial_rejection_skips_model() {
    let f = fixture(MockLlm::replying("ок"), MockStt::transcribing(""), None).await;

    for _ in 0..10 {
        f.handler.handle(&text_message(1, "привет")).await;
    }
    f.handler.handle(&text_message(1, "привет")).await;

    let sent = f.bot.sent();
    assert_eq!(sent.len(), 11);
    assert_eq!(sent[10].1, replies::FREE_LIMIT_REACHED);
    assert_eq!(f.llm.calls().len(), 10);
}

/// **Test: Daily cap rejection sends the canned reply without a model call.**
///
/// **Setup:** Subscribed user with 99 daily messages already counted.
/// **Action:** Handle one message.
/// **Expected:** Daily-limit reply; zero model calls.
#[tokio::test]
async fn test_daily_cap_rejection() {
    let f = fixture(MockLlm::replying("ок"), MockStt::transcribing(""), None).await;
    let now = Utc::now();
    f.users.get_or_create(1, now).await.expect("create");
    f.users
        .set_subscription_end(1, Some(now + ChronoDuration::days(30)))
        .await
        .expect("subscribe");
    for _ in 0..99 {
        f.users.increment_daily(1).await.expect("increment");
    }

    f.handler.handle(&text_message(1, "привет")).await;

    let sent = f.bot.sent();
    assert_eq!(sent, vec![(1, replies::DAILY_LIMIT_REACHED.to_string())]);
    assert!(f.llm.calls().is_empty());
}

/// **Test: Voice over the daily minute cap is rejected before transcription.**
///
/// **Setup:** Subscribed user with 20 voice minutes used.
/// **Action:** Handle a voice message.
/// **Expected:** Voice-limit reply; transcription and model never invoked.
#[tokio::test]
async fn test_voice_cap_rejection_skips_transcription() {
    let f = fixture(MockLlm::replying("ок"), MockStt::transcribing("текст"), None).await;
    let now = Utc::now();
    f.users.get_or_create(1, now).await.expect("create");
    f.users
        .set_subscription_end(1, Some(now + ChronoDuration::days(30)))
        .await
        .expect("subscribe");
    f.users.add_voice_minutes(1, 20.0).await.expect("add");

    f.handler.handle(&voice_message(1, 60)).await;

    let sent = f.bot.sent();
    assert_eq!(sent, vec![(1, replies::VOICE_LIMIT_REACHED.to_string())]);
    assert_eq!(f.stt.call_count(), 0);
    assert!(f.llm.calls().is_empty());
}

/// **Test: Accepted voice is transcribed, counted, and answered.**
///
/// **Setup:** Fresh user; transcription yields text.
/// **Action:** Handle a 90-second voice message.
/// **Expected:** Model receives the transcribed text; 1.5 minutes recorded.
#[tokio::test]
async fn test_voice_flow() {
    let f = fixture(
        MockLlm::replying("слышу тебя"),
        MockStt::transcribing("мне тяжело"),
        None,
    )
    .await;

    f.handler.handle(&voice_message(1, 90)).await;

    assert_eq!(f.stt.call_count(), 1);
    let calls = f.llm.calls();
    assert_eq!(calls.len(), 1);
    let last = calls[0].messages.last().expect("non-empty");
    assert_eq!(last.content, "мне тяжело");

    let user = f.users.get(1).await.expect("get").expect("user exists");
    assert!((user.voice_minutes_today - 1.5).abs() < 1e-9);

    assert_eq!(f.bot.sent(), vec![(1, "слышу тебя".to_string())]);
}

/// **Test: Empty transcription asks the user to retype; nothing is persisted.**
#[tokio::test]
async fn test_empty_transcription() {
    let f = fixture(MockLlm::replying("ок"), MockStt::transcribing("   "), None).await;

    f.handler.handle(&voice_message(1, 30)).await;

    assert_eq!(
        f.bot.sent(),
        vec![(1, replies::TRANSCRIPTION_EMPTY.to_string())]
    );
    assert!(f.llm.calls().is_empty());
    assert_eq!(f.messages.count_for_user(1).await.expect("count"), 0);
}

/// **Test: Empty text asks for text or voice.**
#[tokio::test]
async fn test_empty_text() {
    let f = fixture(MockLlm::replying("ок"), MockStt::transcribing(""), None).await;

    f.handler.handle(&text_message(1, "   ")).await;

    assert_eq!(f.bot.sent(), vec![(1, replies::EMPTY_INPUT.to_string())]);
    assert!(f.llm.calls().is_empty());
}

/// **Test: Model failure sends the apology and notifies the admin with detail.**
///
/// **Setup:** Failing model; admin id 99.
/// **Action:** Handle a text message from user 1.
/// **Expected:** Apology to the user's chat, failure detail to the admin
/// chat; the user turn stays persisted (no rollback).
#[tokio::test]
async fn test_model_failure_apologizes_and_notifies_admin() {
    let f = fixture(MockLlm::failing(), MockStt::transcribing(""), Some(99)).await;

    f.handler.handle(&text_message(1, "помоги")).await;

    let sent = f.bot.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], (1, replies::GENERIC_APOLOGY.to_string()));
    assert_eq!(sent[1].0, 99);
    assert!(sent[1].1.contains("1"));

    let turns = f.messages.for_user(1).await.expect("Failed to load turns");
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, "user");
}

/// **Test: History reaches the model only while the memory window is open.**
///
/// **Setup:** Subscribed user with two stored turns; second user without a
/// subscription with two stored turns.
/// **Action:** Handle a message from each.
/// **Expected:** The subscribed user's request contains the prior turns;
/// the trial user's does not.
#[tokio::test]
async fn test_history_gated_by_subscription() {
    let f = fixture(MockLlm::replying("ок"), MockStt::transcribing(""), None).await;
    let now = Utc::now();

    f.users.get_or_create(1, now).await.expect("create");
    f.users
        .set_subscription_end(1, Some(now + ChronoDuration::days(30)))
        .await
        .expect("subscribe");
    f.messages.append(1, "user", "раньше", now).await.expect("append");
    f.messages
        .append(1, "assistant", "помню", now)
        .await
        .expect("append");

    f.users.get_or_create(2, now).await.expect("create");
    f.messages.append(2, "user", "раньше", now).await.expect("append");
    f.messages
        .append(2, "assistant", "помню", now)
        .await
        .expect("append");

    f.handler.handle(&text_message(1, "мне грустно")).await;
    f.handler.handle(&text_message(2, "мне грустно")).await;

    let calls = f.llm.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].messages.iter().any(|m| m.content == "помню"));
    assert!(!calls[1].messages.iter().any(|m| m.content == "помню"));
}

/// **Test: A detailed request is upgraded to the premium model even on the
/// throttled standard tier.**
///
/// **Setup:** Subscribed user with 60 daily messages (standard-tier band).
/// **Action:** Handle a plain message, then a detail-trigger message.
/// **Expected:** First call uses the standard model; second uses premium
/// with the detailed token budget.
#[tokio::test]
async fn test_detail_overrides_standard_tier() {
    let f = fixture(MockLlm::replying("ок"), MockStt::transcribing(""), None).await;
    let now = Utc::now();
    f.users.get_or_create(1, now).await.expect("create");
    f.users
        .set_subscription_end(1, Some(now + ChronoDuration::days(30)))
        .await
        .expect("subscribe");
    for _ in 0..60 {
        f.users.increment_daily(1).await.expect("increment");
    }

    f.handler.handle(&text_message(1, "мне грустно")).await;
    f.handler
        .handle(&text_message(1, "разложи по полочкам, что со мной"))
        .await;

    let calls = f.llm.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].model, "gpt-3.5-turbo");
    assert_eq!(calls[0].max_tokens, 500);
    assert_eq!(calls[1].model, "gpt-4o-mini");
    assert_eq!(calls[1].max_tokens, 1500);
}

/// **Test: /start registers the user and greets from the pool.**
#[tokio::test]
async fn test_start_greets_and_registers() {
    let f = fixture(MockLlm::replying("ок"), MockStt::transcribing(""), None).await;

    f.handler.handle_start(&text_message(7, "/start")).await;

    assert!(f.users.get(7).await.expect("get").is_some());
    let sent = f.bot.sent();
    assert_eq!(sent.len(), 1);
    assert!(replies::GREETINGS.contains(&sent[0].1.as_str()));
    assert!(f.llm.calls().is_empty());
}
