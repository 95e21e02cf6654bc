//! End-to-end tests for the referral funnel
//!
//! These drive `Funnel` with the in-memory database and a scripted
//! generation service, covering the full interview and portrait cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use portrait_core::config::ModelConfig;
use portrait_core::interview::SessionState;
use portrait_core::texts::{self, QUESTIONS};
use portrait_core::{
    Funnel, GenerationError, GenerationRequest, Inbound, Outgoing, PortraitGenerator,
    ReferralLinks, Store, TextGenerator, UserId,
};

const REFERRER: UserId = UserId::new(42);
const ANSWERS: [&str; 5] = ["Свет", "Река", "Тепло", "Синий", "В танце"];

/// Scripted generation service that records every prompt it receives
#[derive(Clone)]
struct ScriptedGenerator {
    reply: Result<String, Duration>,
    calls: Arc<AtomicUsize>,
    prompts: Arc<std::sync::Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Arc::default(),
            prompts: Arc::default(),
        }
    }

    /// Never answers within any reasonable timeout
    fn stalling(delay: Duration) -> Self {
        Self {
            reply: Err(delay),
            calls: Arc::default(),
            prompts: Arc::default(),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(delay) => {
                tokio::time::sleep(*delay).await;
                Err(GenerationError::EmptyResponse {
                    model: "stalled".to_string(),
                })
            }
        }
    }
}

async fn funnel_with(generator: ScriptedGenerator) -> Funnel<ScriptedGenerator> {
    let store = Store::in_memory().await.unwrap();
    let config = ModelConfig {
        timeout_secs: 0,
        ..ModelConfig::default()
    };
    let portraits =
        PortraitGenerator::new(generator, &config).with_timeout(Duration::from_millis(200));
    Funnel::new(store, portraits, ReferralLinks::for_bot("yaznayu_bot"))
}

fn start(from: i64, argument: Option<&str>) -> Inbound {
    Inbound::Start {
        from: UserId::new(from),
        argument: argument.map(String::from),
    }
}

fn text(from: i64, text: &str) -> Inbound {
    Inbound::Text {
        from: UserId::new(from),
        text: text.to_string(),
    }
}

/// Run one friend through the whole interview and return the final replies
async fn complete_interview(funnel: &Funnel<ScriptedGenerator>, friend: i64) -> Vec<Outgoing> {
    funnel.handle(start(friend, Some("ref_42"))).await.unwrap();
    for answer in &ANSWERS[..4] {
        funnel.handle(text(friend, answer)).await.unwrap();
    }
    funnel.handle(text(friend, ANSWERS[4])).await.unwrap()
}

#[tokio::test]
async fn start_without_referral_sends_own_link() {
    let funnel = funnel_with(ScriptedGenerator::replying("unused")).await;

    for argument in [None, Some("ref_abc"), Some("hello")] {
        let out = funnel.handle(start(7, argument)).await.unwrap();
        assert_eq!(
            out,
            vec![Outgoing::new(
                UserId::new(7),
                texts::welcome("https://t.me/yaznayu_bot?start=ref_7")
            )]
        );
        assert_eq!(funnel.sessions().state(UserId::new(7)), SessionState::Idle);
    }

    let user = funnel.store().get_user(UserId::new(7)).await.unwrap().unwrap();
    assert_eq!(user.referrer_id, None);
}

#[tokio::test]
async fn start_with_referral_opens_interview() {
    let funnel = funnel_with(ScriptedGenerator::replying("unused")).await;

    let out = funnel.handle(start(100, Some("ref_42"))).await.unwrap();
    assert_eq!(
        out,
        vec![Outgoing::new(UserId::new(100), texts::interview_intro(QUESTIONS[0]))]
    );
    assert_eq!(
        funnel.sessions().state(UserId::new(100)),
        SessionState::AwaitingAnswer(0)
    );
    assert_eq!(funnel.sessions().referrer_of(UserId::new(100)), Some(REFERRER));

    let friend = funnel.store().get_user(UserId::new(100)).await.unwrap().unwrap();
    assert_eq!(friend.referrer_id, Some(REFERRER));
}

#[tokio::test]
async fn text_without_session_produces_nothing() {
    let funnel = funnel_with(ScriptedGenerator::replying("unused")).await;

    let out = funnel.handle(text(5, "just saying hi")).await.unwrap();
    assert!(out.is_empty());
    assert_eq!(funnel.store().stats().await.unwrap().answer_sets, 0);
    assert_eq!(funnel.store().get_user(UserId::new(5)).await.unwrap(), None);
}

#[tokio::test]
async fn each_answer_gets_the_next_question() {
    let funnel = funnel_with(ScriptedGenerator::replying("unused")).await;
    funnel.handle(start(100, Some("ref_42"))).await.unwrap();

    for (i, answer) in ANSWERS[..4].iter().enumerate() {
        let out = funnel.handle(text(100, answer)).await.unwrap();
        assert_eq!(out, vec![Outgoing::new(UserId::new(100), QUESTIONS[i + 1])]);
    }
    // Nothing is persisted before the last answer
    assert_eq!(funnel.store().stats().await.unwrap().answer_sets, 0);
}

#[tokio::test]
async fn completed_interview_is_stored_once_in_order() {
    let generator = ScriptedGenerator::replying("unused");
    let funnel = funnel_with(generator.clone()).await;

    let out = complete_interview(&funnel, 100).await;
    assert_eq!(
        out,
        vec![Outgoing::new(
            UserId::new(100),
            texts::reshare("https://t.me/yaznayu_bot?start=ref_100")
        )]
    );

    let sets = funnel.store().answer_sets_for(REFERRER).await.unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].friend_id, UserId::new(100));
    assert_eq!(sets[0].answers, ANSWERS.to_vec());
    assert_eq!(funnel.store().answers_count(REFERRER).await.unwrap(), Some(1));
    assert_eq!(funnel.sessions().state(UserId::new(100)), SessionState::Idle);

    // Further text after completion is ignored
    assert!(funnel.handle(text(100, "more")).await.unwrap().is_empty());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn third_answer_set_triggers_portrait() {
    let generator = ScriptedGenerator::replying("Ты — горная река.");
    let funnel = funnel_with(generator.clone()).await;
    funnel.handle(start(42, None)).await.unwrap();

    complete_interview(&funnel, 100).await;
    complete_interview(&funnel, 101).await;
    assert_eq!(generator.calls(), 0);

    let out = complete_interview(&funnel, 102).await;
    assert_eq!(
        out,
        vec![
            Outgoing::new(REFERRER, texts::portrait_ready("Ты — горная река.")),
            Outgoing::new(
                UserId::new(102),
                texts::reshare("https://t.me/yaznayu_bot?start=ref_102")
            ),
        ]
    );
    assert_eq!(generator.calls(), 1);

    let prompt = generator.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("Проанализируй 3 ответов"));
    assert!(prompt.contains("Друг 3:\n1. Свет"));

    let user = funnel.store().get_user(REFERRER).await.unwrap().unwrap();
    assert_eq!(user.answers_count, 3);
    assert!(user.analysis_sent);
}

#[tokio::test]
async fn portraits_fire_only_at_thresholds() {
    let generator = ScriptedGenerator::replying("portrait");
    let funnel = funnel_with(generator.clone()).await;

    let mut fired_at = Vec::new();
    for friend in 0..11 {
        let out = complete_interview(&funnel, 200 + friend).await;
        if out.len() == 2 {
            fired_at.push(friend + 1);
        }
    }
    assert_eq!(fired_at, vec![3, 5, 10]);
    assert_eq!(generator.calls(), 3);
}

#[tokio::test]
async fn generation_timeout_sends_apology() {
    let generator = ScriptedGenerator::stalling(Duration::from_secs(30));
    let funnel = funnel_with(generator.clone()).await;
    funnel.handle(start(42, None)).await.unwrap();

    complete_interview(&funnel, 100).await;
    complete_interview(&funnel, 101).await;
    let out = complete_interview(&funnel, 102).await;

    assert_eq!(out[0], Outgoing::new(REFERRER, texts::FAILURE_NOTICE));
    assert_eq!(out.len(), 2);

    let user = funnel.store().get_user(REFERRER).await.unwrap().unwrap();
    assert!(!user.analysis_sent);
    assert_eq!(user.answers_count, 3);
}

#[tokio::test]
async fn status_reports_count_and_is_idempotent() {
    let funnel = funnel_with(ScriptedGenerator::replying("unused")).await;

    let out = funnel
        .handle(Inbound::Status { from: REFERRER })
        .await
        .unwrap();
    assert_eq!(out, vec![Outgoing::new(REFERRER, texts::NOT_REGISTERED)]);

    funnel.handle(start(42, None)).await.unwrap();
    complete_interview(&funnel, 100).await;

    let first = funnel.handle(Inbound::Status { from: REFERRER }).await.unwrap();
    let second = funnel.handle(Inbound::Status { from: REFERRER }).await.unwrap();
    assert_eq!(first, vec![Outgoing::new(REFERRER, "📊 Собрано ответов: 1/10")]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn restarting_interview_discards_partial_answers() {
    let funnel = funnel_with(ScriptedGenerator::replying("unused")).await;

    funnel.handle(start(100, Some("ref_42"))).await.unwrap();
    funnel.handle(text(100, "first try")).await.unwrap();
    funnel.handle(text(100, "second")).await.unwrap();

    funnel.handle(start(100, Some("ref_43"))).await.unwrap();
    for answer in ANSWERS {
        funnel.handle(text(100, answer)).await.unwrap();
    }

    assert!(funnel.store().answer_sets_for(REFERRER).await.unwrap().is_empty());
    let sets = funnel.store().answer_sets_for(UserId::new(43)).await.unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].answers, ANSWERS.to_vec());
}

#[tokio::test]
async fn preview_prompt_uses_stored_answers() {
    let funnel = funnel_with(ScriptedGenerator::replying("unused")).await;
    assert!(funnel.preview_prompt(REFERRER).await.is_err());

    complete_interview(&funnel, 100).await;
    let prompt = funnel.preview_prompt(REFERRER).await.unwrap();
    assert!(prompt.contains("Проанализируй 1 ответов"));
    assert!(prompt.contains("5. В танце"));
}

#[tokio::test]
async fn portrait_is_delivered_when_flag_write_fails() {
    let generator = ScriptedGenerator::replying("Ты — горная река.");
    let funnel = funnel_with(generator.clone()).await;
    funnel.handle(start(42, None)).await.unwrap();

    complete_interview(&funnel, 100).await;
    complete_interview(&funnel, 101).await;

    // Reject any attempt to set the flag
    funnel
        .store()
        .as_ref()
        .query("DEFINE FIELD OVERWRITE analysis_sent ON user TYPE bool DEFAULT false ASSERT $value = false")
        .await
        .unwrap()
        .check()
        .unwrap();

    let out = complete_interview(&funnel, 102).await;
    assert_eq!(
        out[0],
        Outgoing::new(REFERRER, texts::portrait_ready("Ты — горная река."))
    );
    assert_eq!(out.len(), 2);
    assert_eq!(generator.calls(), 1);

    let user = funnel.store().get_user(REFERRER).await.unwrap().unwrap();
    assert!(!user.analysis_sent);
}

#[tokio::test]
async fn start_without_referral_keeps_running_interview() {
    let funnel = funnel_with(ScriptedGenerator::replying("unused")).await;
    let friend = UserId::new(100);

    funnel.handle(start(100, Some("ref_42"))).await.unwrap();
    funnel.handle(text(100, ANSWERS[0])).await.unwrap();

    let out = funnel.handle(start(100, None)).await.unwrap();
    assert_eq!(
        out,
        vec![Outgoing::new(
            friend,
            texts::welcome("https://t.me/yaznayu_bot?start=ref_100")
        )]
    );
    assert_eq!(funnel.sessions().state(friend), SessionState::AwaitingAnswer(1));
    assert_eq!(funnel.sessions().referrer_of(friend), Some(REFERRER));

    for answer in &ANSWERS[1..] {
        funnel.handle(text(100, answer)).await.unwrap();
    }

    let sets = funnel.store().answer_sets_for(REFERRER).await.unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].answers, ANSWERS.to_vec());
    assert_eq!(funnel.sessions().state(friend), SessionState::Idle);
}
