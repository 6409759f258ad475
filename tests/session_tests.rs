// Integration tests for interview sessions
//
// Sessions run on their own task; tests drive them through the handle and
// watch the event stream.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use voice_interview::{
    Config, ConversationEngine, InterviewHandle, InterviewSession, Message, QuestionDefinition,
    QuestionGraph, Role, RuleValidator, ScriptFeeder, ScriptedSpeechSource, SessionConfig,
    SessionError, SessionEvent, SilentSink, TurnOutcome, UtteranceSegmenter, ValidationRule,
    ValidatorMessages, VoiceInputController,
};

fn graph() -> Arc<QuestionGraph> {
    Arc::new(
        QuestionGraph::new(vec![
            QuestionDefinition::new("name", "What is your full name?")
                .with_rule(ValidationRule::MinWords { count: 2 }),
            QuestionDefinition::new("zip_code", "What is your zip code?")
                .with_rule(ValidationRule::Digits { min: 5, max: 5 }),
        ])
        .expect("valid graph"),
    )
}

/// Session with rule validation and a scripted microphone
fn scripted_session() -> (InterviewHandle, ScriptFeeder) {
    let graph = graph();
    let validator = Arc::new(RuleValidator::new(graph.clone(), ValidatorMessages::default()));
    let engine = ConversationEngine::new(graph, validator, Arc::new(SilentSink));

    let (source, feeder) = ScriptedSpeechSource::new();
    let voice = VoiceInputController::new(
        Box::new(source),
        UtteranceSegmenter::new(Duration::from_millis(500)),
        engine.subscribe(),
    );

    let (session, handle) = InterviewSession::new("interview-test".to_string(), engine, voice);
    session.spawn();

    (handle, feeder)
}

/// Next event, skipping live text updates
async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    loop {
        match events.recv().await.expect("event") {
            SessionEvent::LiveText { .. } => continue,
            event => return event,
        }
    }
}

#[tokio::test]
async fn test_typed_interview() -> Result<()> {
    let (handle, _feeder) = scripted_session();

    let first = handle.start_conversation().await?;
    assert_eq!(first, Message::assistant("What is your full name?"));
    assert_eq!(
        handle.current_question().map(|q| q.id),
        Some("name".to_string())
    );

    let exchange = handle.handle_response("Jane Doe").await?.expect("exchange");
    assert_eq!(
        exchange.outcome,
        TurnOutcome::Advanced {
            next: "zip_code".to_string()
        }
    );

    let exchange = handle.handle_response("12").await?.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Retry);

    let exchange = handle.handle_response("94105").await?.expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Completed);
    assert!(handle.current_question().is_none());

    // Ignored once the interview is over
    assert!(handle.handle_response("hello?").await?.is_none());

    let transcript = handle.transcript().await?;
    assert_eq!(transcript.len(), 7);
    let roles: Vec<Role> = transcript.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
        ]
    );

    let stats = handle.stats().await?;
    assert_eq!(stats.answered, 2);
    assert_eq!(stats.retries, 1);
    assert_eq!(stats.messages, 7);
    assert!(stats.current_question.is_none());

    Ok(())
}

#[tokio::test]
async fn test_empty_response_leaves_transcript_alone() -> Result<()> {
    let (handle, _feeder) = scripted_session();
    handle.start_conversation().await?;

    assert!(handle.handle_response("   ").await?.is_none());
    assert_eq!(handle.transcript().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_restart_clears_transcript() -> Result<()> {
    let (handle, _feeder) = scripted_session();
    handle.start_conversation().await?;
    handle.handle_response("Jane Doe").await?;

    handle.start_conversation().await?;

    assert_eq!(
        handle.transcript().await?,
        vec![Message::assistant("What is your full name?")]
    );
    assert_eq!(
        handle.current_question().map(|q| q.id),
        Some("name".to_string())
    );
    assert_eq!(handle.stats().await?.answered, 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_spoken_answer_is_submitted() -> Result<()> {
    let (handle, feeder) = scripted_session();
    let mut events = handle.subscribe();

    handle.start_conversation().await?;
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Message(Message::assistant("What is your full name?"))
    );

    assert!(handle.toggle_voice().await?);
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::CaptureChanged { capturing: true }
    );

    feeder.interim("Jane", 0).await;
    feeder.finalized("Jane Doe", 0).await;

    // Silence ends the capture and the answer goes to the engine
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::CaptureChanged { capturing: false }
    );
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Message(Message::user("Jane Doe"))
    );
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Message(Message::assistant("Thank you. What is your zip code?"))
    );

    assert_eq!(
        handle.current_question().map(|q| q.id),
        Some("zip_code".to_string())
    );
    assert!(!handle.stats().await?.capturing);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_live_text_is_published() -> Result<()> {
    let (handle, feeder) = scripted_session();
    let mut events = handle.subscribe();

    handle.start_conversation().await?;
    handle.toggle_voice().await?;
    feeder.interim("nine four", 0).await;

    loop {
        if let SessionEvent::LiveText { text } = events.recv().await? {
            assert_eq!(text, "nine four");
            break;
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_lagging_subscriber_resyncs_from_transcript() -> Result<()> {
    let (handle, _feeder) = scripted_session();
    let mut events = handle.subscribe();

    handle.start_conversation().await?;
    for _ in 0..140 {
        handle.handle_response("Jane").await?;
    }

    assert!(matches!(
        events.recv().await,
        Err(broadcast::error::RecvError::Lagged(_))
    ));

    let transcript = handle.transcript().await?;
    assert_eq!(transcript.len(), 281);
    assert_eq!(transcript[0], Message::assistant("What is your full name?"));
    assert_eq!(transcript[280].role, Role::Assistant);

    Ok(())
}

#[tokio::test]
async fn test_voice_unavailable_before_start() -> Result<()> {
    let (handle, feeder) = scripted_session();

    assert!(!handle.toggle_voice().await?);
    assert_eq!(feeder.starts(), 0);

    Ok(())
}

#[tokio::test]
async fn test_disabled_voice_reports_capture_error() -> Result<()> {
    let config = SessionConfig {
        session_id: "interview-text-only".to_string(),
        ..SessionConfig::default()
    };
    let (session, handle) = InterviewSession::build(config, graph(), None).await?;
    session.spawn();

    let mut events = handle.subscribe();
    handle.start_conversation().await?;

    let err = handle.toggle_voice().await.unwrap_err();
    assert!(matches!(err, SessionError::Capture(_)));

    loop {
        if let SessionEvent::CaptureFailed { reason } = events.recv().await? {
            assert!(reason.contains("disabled"));
            break;
        }
    }

    // Typing still works
    assert!(handle.handle_response("Jane Doe").await?.is_some());

    Ok(())
}

#[tokio::test]
async fn test_shutdown_closes_session() -> Result<()> {
    let (handle, feeder) = scripted_session();
    handle.start_conversation().await?;
    handle.toggle_voice().await?;

    let stats = handle.shutdown().await?;
    assert_eq!(stats.session_id, "interview-test");
    assert_eq!(stats.messages, 1);
    assert!(!feeder.is_capturing());

    assert!(matches!(
        handle.handle_response("Jane Doe").await,
        Err(SessionError::Closed)
    ));
    assert!(handle.is_closed());

    Ok(())
}

#[test]
fn test_session_event_json() -> Result<()> {
    let event = SessionEvent::Message(Message::user("Jane Doe"));
    let json = serde_json::to_value(&event)?;
    assert_eq!(json["type"], "message");
    assert_eq!(json["role"], "user");
    assert_eq!(json["text"], "Jane Doe");

    let json = serde_json::to_value(SessionEvent::CaptureChanged { capturing: true })?;
    assert_eq!(json["type"], "capture_changed");
    assert_eq!(json["capturing"], true);

    Ok(())
}

#[tokio::test]
async fn test_bundled_interview_declined_on_confirmation() -> Result<()> {
    let cfg = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/voice-interview"))?;
    let graph = Arc::new(cfg.question_graph()?);
    let config = cfg.session_config(Some("interview-bundled".to_string()));
    let messages = config.messages.clone();

    let (session, handle) = InterviewSession::build(config, graph, None).await?;
    session.spawn();
    handle.start_conversation().await?;

    for answer in [
        "Jane Doe",
        "one two three four five six seven",
        "94105",
        "my email is jane at example dot com",
        "the smart speaker",
    ] {
        let exchange = handle.handle_response(answer).await?.expect("exchange");
        assert!(
            matches!(exchange.outcome, TurnOutcome::Advanced { .. }),
            "{} was not accepted: {:?}",
            answer,
            exchange.outcome
        );
    }
    assert_eq!(
        handle.current_question().map(|q| q.id),
        Some("confirm".to_string())
    );

    let exchange = handle
        .handle_response("That's not correct.")
        .await?
        .expect("exchange");
    assert_eq!(exchange.outcome, TurnOutcome::Ended);
    assert_eq!(exchange.assistant.text, messages.declined);
    assert!(handle.current_question().is_none());

    Ok(())
}
