// Integration tests for the conversation engine
//
// The validator and speech sink are test doubles: the validator replays a
// queue of verdicts and records what it was asked, the sink records what it
// was told to say.

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use voice_interview::{
    ConversationEngine, EngineState, Message, QuestionDefinition, QuestionGraph,
    ResponseValidator, RuleValidator, SilentSink, SpeechSink, TurnOutcome, ValidationError,
    ValidationResult, ValidatorMessages, FALLBACK_MESSAGE,
};

#[derive(Default)]
struct QueuedValidator {
    verdicts: Mutex<VecDeque<Result<ValidationResult, ValidationError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl QueuedValidator {
    fn with(verdicts: Vec<Result<ValidationResult, ValidationError>>) -> Arc<Self> {
        Arc::new(Self {
            verdicts: Mutex::new(verdicts.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ResponseValidator for QueuedValidator {
    async fn validate(
        &self,
        question_id: &str,
        raw_text: &str,
    ) -> Result<ValidationResult, ValidationError> {
        self.calls
            .lock()
            .unwrap()
            .push((question_id.to_string(), raw_text.to_string()));
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ValidationResult::accept("ok")))
    }

    fn name(&self) -> &str {
        "queued"
    }
}

#[derive(Default)]
struct RecordingSink {
    spoken: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait::async_trait]
impl SpeechSink for RecordingSink {
    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            anyhow::bail!("speaker unplugged");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn two_questions() -> Arc<QuestionGraph> {
    Arc::new(
        QuestionGraph::new(vec![
            QuestionDefinition::new("q1", "What is your name?"),
            QuestionDefinition::new("q2", "What is your order number?"),
        ])
        .expect("valid graph"),
    )
}

fn engine_with(validator: Arc<QueuedValidator>) -> ConversationEngine {
    ConversationEngine::new(two_questions(), validator, Arc::new(SilentSink))
}

#[tokio::test]
async fn test_start_then_advance_then_end() {
    let validator = QueuedValidator::with(vec![
        Ok(ValidationResult::accept("Thanks. What is your order number?")),
        Ok(ValidationResult::end("Goodbye!")),
    ]);
    let mut engine = engine_with(validator.clone());
    let mut transcript: Vec<Message> = Vec::new();

    assert_eq!(engine.state(), EngineState::Idle);

    let first = engine.start().await;
    assert_eq!(first, Message::assistant("What is your name?"));
    assert_eq!(engine.state(), EngineState::AwaitingResponse);
    transcript.push(first);

    let exchange = engine.respond("ok").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Advanced { next: "q2".to_string() });
    assert_eq!(engine.current_question().map(|q| q.id.as_str()), Some("q2"));
    transcript.extend(exchange.messages().into_iter().cloned());
    assert_eq!(transcript.len(), 3);

    let exchange = engine.respond("done").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Ended);
    assert_eq!(exchange.user, Message::user("done"));
    assert_eq!(exchange.assistant, Message::assistant("Goodbye!"));
    assert_eq!(engine.state(), EngineState::Idle);
    assert!(engine.current_question().is_none());
    transcript.extend(exchange.messages().into_iter().cloned());
    assert_eq!(transcript.len(), 5);

    // Idle until restarted
    assert!(engine.respond("hello?").await.is_none());
    assert_eq!(
        validator.calls(),
        vec![
            ("q1".to_string(), "ok".to_string()),
            ("q2".to_string(), "done".to_string()),
        ]
    );

    engine.start().await;
    assert_eq!(engine.current_question().map(|q| q.id.as_str()), Some("q1"));
}

#[tokio::test]
async fn test_empty_response_is_ignored() {
    let validator = QueuedValidator::with(vec![]);
    let mut engine = engine_with(validator.clone());
    engine.start().await;

    assert!(engine.respond("").await.is_none());
    assert!(engine.respond("   \t\n").await.is_none());
    assert!(validator.calls().is_empty());
    assert_eq!(engine.current_question().map(|q| q.id.as_str()), Some("q1"));
}

#[tokio::test]
async fn test_respond_before_start_is_ignored() {
    let validator = QueuedValidator::with(vec![]);
    let mut engine = engine_with(validator.clone());

    assert!(engine.respond("hello").await.is_none());
    assert!(validator.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_answer_keeps_question() {
    let validator = QueuedValidator::with(vec![Ok(ValidationResult::reject(
        "I didn't catch that. What is your name?",
    ))]);
    let mut engine = engine_with(validator);
    engine.start().await;

    let exchange = engine.respond("mumble").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Retry);
    assert_eq!(
        exchange.assistant.text,
        "I didn't catch that. What is your name?"
    );
    assert_eq!(engine.current_question().map(|q| q.id.as_str()), Some("q1"));
}

#[tokio::test]
async fn test_valid_answer_on_last_question_completes() {
    let validator = QueuedValidator::with(vec![
        Ok(ValidationResult::accept("Next")),
        Ok(ValidationResult::accept("All done")),
    ]);
    let mut engine = engine_with(validator);
    engine.start().await;

    engine.respond("Jane Doe").await;
    let exchange = engine.respond("123456").await.expect("exchange");

    assert_eq!(exchange.outcome, TurnOutcome::Completed);
    assert!(exchange.outcome.is_terminal());
    assert_eq!(engine.state(), EngineState::Idle);
}

#[tokio::test]
async fn test_end_chat_wins_over_valid() {
    let validator = QueuedValidator::with(vec![Ok(ValidationResult {
        is_valid: true,
        message: "Bye".to_string(),
        end_chat: true,
    })]);
    let mut engine = engine_with(validator);
    engine.start().await;

    let exchange = engine.respond("no").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Ended);
    assert!(engine.current_question().is_none());
}

#[tokio::test]
async fn test_validator_failure_uses_fallback() {
    let validator = QueuedValidator::with(vec![Err(ValidationError::Remote(
        "connection refused".to_string(),
    ))]);
    let mut engine = engine_with(validator);
    engine.start().await;

    let exchange = engine.respond("Jane").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Failed);
    assert_eq!(exchange.user, Message::user("Jane"));
    assert_eq!(exchange.assistant, Message::assistant(FALLBACK_MESSAGE));
    assert!(!exchange.assistant.text.contains("connection refused"));
    assert_eq!(engine.current_question().map(|q| q.id.as_str()), Some("q1"));
}

#[tokio::test]
async fn test_restart_mid_interview() {
    let validator = QueuedValidator::with(vec![]);
    let mut engine = engine_with(validator);
    engine.start().await;
    engine.respond("Jane").await;
    assert_eq!(engine.current_question().map(|q| q.id.as_str()), Some("q2"));

    let message = engine.start().await;
    assert_eq!(message.text, "What is your name?");
    assert_eq!(engine.current_question().map(|q| q.id.as_str()), Some("q1"));
}

#[tokio::test]
async fn test_every_reply_is_narrated() {
    let sink = Arc::new(RecordingSink::default());
    let validator = QueuedValidator::with(vec![
        Ok(ValidationResult::accept("Thanks. Order number?")),
        Err(ValidationError::Timeout(std::time::Duration::from_secs(5))),
    ]);
    let mut engine = ConversationEngine::new(two_questions(), validator, sink.clone());

    engine.start().await;
    engine.respond("Jane").await;
    engine.respond("12").await;

    assert_eq!(
        *sink.spoken.lock().unwrap(),
        vec![
            "What is your name?".to_string(),
            "Thanks. Order number?".to_string(),
            FALLBACK_MESSAGE.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_speech_failure_does_not_block_turn() {
    let sink = Arc::new(RecordingSink {
        fail: true,
        ..Default::default()
    });
    let validator = QueuedValidator::with(vec![]);
    let mut engine = ConversationEngine::new(two_questions(), validator, sink);

    engine.start().await;
    let exchange = engine.respond("Jane").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Advanced { next: "q2".to_string() });
}

#[tokio::test]
async fn test_question_changes_are_published() {
    let validator = QueuedValidator::with(vec![Ok(ValidationResult::end("Bye"))]);
    let mut engine = engine_with(validator);
    let question_rx = engine.subscribe();

    assert!(question_rx.borrow().is_none());

    engine.start().await;
    assert_eq!(question_rx.borrow().as_ref().map(|q| q.id.clone()), Some("q1".to_string()));

    engine.respond("stop").await;
    assert!(question_rx.borrow().is_none());
}

#[tokio::test]
async fn test_rule_validator_drives_full_interview() -> Result<()> {
    let graph = Arc::new(QuestionGraph::new(vec![
        QuestionDefinition::new("name", "What is your full name?").with_rule(
            voice_interview::ValidationRule::MinWords { count: 2 },
        ),
        QuestionDefinition::new("zip_code", "What is your zip code?")
            .with_rule(voice_interview::ValidationRule::Digits { min: 5, max: 5 }),
        QuestionDefinition::new("confirm", "Is that correct?")
            .with_rule(voice_interview::ValidationRule::YesNo { end_on_no: true }),
    ])?);
    let messages = ValidatorMessages::default();
    let validator = Arc::new(RuleValidator::new(graph.clone(), messages.clone()));
    let mut engine = ConversationEngine::new(graph, validator, Arc::new(SilentSink));

    engine.start().await;

    let exchange = engine.respond("Jane").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Retry);
    assert!(exchange.assistant.text.ends_with("What is your full name?"));

    let exchange = engine.respond("Jane Doe").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Advanced { next: "zip_code".to_string() });
    assert_eq!(exchange.assistant.text, "Thank you. What is your zip code?");

    let exchange = engine.respond("nine four one oh five").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Advanced { next: "confirm".to_string() });

    let exchange = engine.respond("Yes.").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Completed);
    assert_eq!(exchange.assistant.text, messages.completion);

    Ok(())
}

#[tokio::test]
async fn test_rule_validator_stop_and_decline() -> Result<()> {
    let graph = Arc::new(QuestionGraph::new(vec![
        QuestionDefinition::new("name", "What is your name?"),
        QuestionDefinition::new("confirm", "Is that correct?")
            .with_rule(voice_interview::ValidationRule::YesNo { end_on_no: true }),
    ])?);
    let messages = ValidatorMessages::default();
    let validator = Arc::new(RuleValidator::new(graph.clone(), messages.clone()));
    let mut engine = ConversationEngine::new(graph, validator, Arc::new(SilentSink));

    engine.start().await;
    let exchange = engine.respond("Cancel!").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Ended);
    assert_eq!(exchange.assistant.text, messages.stopped);

    engine.start().await;
    engine.respond("Jane").await;
    let exchange = engine.respond("no, it's not").await.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Ended);
    assert_eq!(exchange.assistant.text, messages.declined);

    Ok(())
}
