use super::config::{SessionConfig, ValidatorKind};
use super::stats::SessionStats;
use crate::conversation::{ConversationEngine, Exchange, Message, TurnOutcome};
use crate::error::{CaptureError, SessionError};
use crate::nats::NatsClient;
use crate::questions::{Question, QuestionGraph};
use crate::speech::{
    NarrationMode, NatsSpeechSink, SilentSink, SpeechSink, SpeechSource, SpeechSourceFactory,
    UtteranceSegmenter,
};
use crate::validation::{NatsValidator, ResponseValidator, RuleValidator};
use crate::voice::{VoiceInputController, VoiceUpdate};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 256;

/// Observable session output, delivered in order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A message was appended to the transcript
    Message(Message),
    /// Live text of the capture in progress
    LiveText { text: String },
    /// Voice capture started or stopped
    CaptureChanged { capturing: bool },
    /// Voice capture failed; the user can retry or type
    CaptureFailed { reason: String },
}

enum Command {
    Start(oneshot::Sender<Message>),
    Respond(String, oneshot::Sender<Option<Exchange>>),
    ToggleVoice(oneshot::Sender<Result<bool, CaptureError>>),
    Transcript(oneshot::Sender<Vec<Message>>),
    Stats(oneshot::Sender<SessionStats>),
    Shutdown(oneshot::Sender<SessionStats>),
}

enum Step {
    Command(Option<Command>),
    Voice(crate::voice::VoiceSignal),
}

#[derive(Default)]
struct TurnCounters {
    answered: usize,
    retries: usize,
    failures: usize,
}

/// One interview: the engine, voice input, and the visible transcript.
///
/// All work runs on the session's own task, one command or voice signal at
/// a time, so responses (typed or spoken) are never validated concurrently.
pub struct InterviewSession {
    session_id: String,
    started_at: chrono::DateTime<chrono::Utc>,
    engine: ConversationEngine,
    voice: VoiceInputController,
    commands: mpsc::Receiver<Command>,
    events_tx: broadcast::Sender<SessionEvent>,
    transcript: Vec<Message>,
    counters: TurnCounters,
}

/// Cloneable API to a running `InterviewSession`
#[derive(Clone)]
pub struct InterviewHandle {
    session_id: String,
    commands: mpsc::Sender<Command>,
    question_rx: watch::Receiver<Option<Question>>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl InterviewSession {
    /// Assemble a session from an engine and a voice controller built on it
    pub fn new(
        session_id: String,
        engine: ConversationEngine,
        voice: VoiceInputController,
    ) -> (Self, InterviewHandle) {
        let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        let handle = InterviewHandle {
            session_id: session_id.clone(),
            commands: commands_tx,
            question_rx: engine.subscribe(),
            events_tx: events_tx.clone(),
        };

        let session = Self {
            session_id,
            started_at: Utc::now(),
            engine,
            voice,
            commands,
            events_tx,
            transcript: Vec::new(),
            counters: TurnCounters::default(),
        };

        (session, handle)
    }

    /// Build a session and its collaborators from configuration.
    ///
    /// Connects to NATS when a collaborator needs it and no client was given.
    pub async fn build(
        config: SessionConfig,
        graph: Arc<QuestionGraph>,
        nats_client: Option<Arc<NatsClient>>,
    ) -> Result<(Self, InterviewHandle)> {
        info!("Creating interview session: {}", config.session_id);

        let nats_client = match nats_client {
            Some(client) => Some(client),
            None if config.needs_nats() => Some(Arc::new(
                NatsClient::connect(&config.nats_url)
                    .await
                    .context("Failed to connect to NATS")?,
            )),
            None => None,
        };

        let validator: Arc<dyn ResponseValidator> = match config.validator {
            ValidatorKind::Rules => Arc::new(RuleValidator::new(
                Arc::clone(&graph),
                config.messages.clone(),
            )),
            ValidatorKind::Nats => Arc::new(NatsValidator::new(
                nats_client.clone().context("NATS validator needs a NATS connection")?,
                config.session_id.clone(),
                config.validation_subject.clone(),
                config.request_timeout,
            )),
        };

        let speech: Arc<dyn SpeechSink> = match config.narration {
            NarrationMode::Silent => Arc::new(SilentSink),
            NarrationMode::Nats => Arc::new(NatsSpeechSink::new(
                nats_client.clone().context("NATS narration needs a NATS connection")?,
                config.session_id.clone(),
                config.await_playback,
                config.request_timeout,
            )),
        };

        let source: Box<dyn SpeechSource> =
            SpeechSourceFactory::create(config.speech_source, &config.session_id, nats_client)
                .context("Failed to create speech source")?;

        let engine = ConversationEngine::new(graph, validator, speech);
        let voice = VoiceInputController::new(
            source,
            UtteranceSegmenter::new(config.silence_delay),
            engine.subscribe(),
        );

        Ok(Self::new(config.session_id, engine, voice))
    }

    /// Run the session on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands and voice signals until shutdown or every handle is gone
    pub async fn run(mut self) {
        info!("Interview session {} running", self.session_id);

        loop {
            let step = tokio::select! {
                command = self.commands.recv() => Step::Command(command),
                signal = self.voice.next_signal() => Step::Voice(signal),
            };

            match step {
                Step::Command(None) => break,
                Step::Command(Some(command)) => {
                    if !self.handle_command(command).await {
                        return;
                    }
                }
                Step::Voice(signal) => {
                    if let Some(update) = self.voice.handle(signal).await {
                        self.apply_voice_update(update).await;
                    }
                }
            }
        }

        self.voice.stop().await;
        info!("Interview session {} closed", self.session_id);
    }

    /// Returns false once the session should end
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Start(reply) => {
                let message = self.engine.start().await;
                self.transcript.clear();
                self.counters = TurnCounters::default();
                self.record(message.clone());
                let _ = reply.send(message);
            }
            Command::Respond(text, reply) => {
                let exchange = self.respond(&text).await;
                let _ = reply.send(exchange);
            }
            Command::ToggleVoice(reply) => {
                let was_capturing = self.voice.is_capturing();
                let result = self.voice.toggle().await;
                match &result {
                    Ok(false) if was_capturing => {
                        self.publish(SessionEvent::CaptureChanged { capturing: false })
                    }
                    Err(e) => self.publish(SessionEvent::CaptureFailed {
                        reason: e.to_string(),
                    }),
                    _ => {}
                }
                let _ = reply.send(result);
            }
            Command::Transcript(reply) => {
                let _ = reply.send(self.transcript.clone());
            }
            Command::Stats(reply) => {
                let _ = reply.send(self.stats());
            }
            Command::Shutdown(reply) => {
                self.voice.stop().await;
                let _ = reply.send(self.stats());
                info!("Interview session {} shut down", self.session_id);
                return false;
            }
        }
        true
    }

    async fn apply_voice_update(&mut self, update: VoiceUpdate) {
        match update {
            VoiceUpdate::Started => self.publish(SessionEvent::CaptureChanged { capturing: true }),
            VoiceUpdate::LiveText(text) => self.publish(SessionEvent::LiveText { text }),
            VoiceUpdate::Utterance(text) => {
                self.publish(SessionEvent::CaptureChanged { capturing: false });
                debug!("Submitting spoken answer");
                self.respond(text.trim()).await;
            }
            VoiceUpdate::Stopped => self.publish(SessionEvent::CaptureChanged { capturing: false }),
            VoiceUpdate::Failed(e) => {
                self.publish(SessionEvent::CaptureFailed {
                    reason: e.to_string(),
                });
                self.publish(SessionEvent::CaptureChanged { capturing: false });
            }
        }
    }

    async fn respond(&mut self, text: &str) -> Option<Exchange> {
        let exchange = self.engine.respond(text).await?;

        match exchange.outcome {
            TurnOutcome::Advanced { .. } | TurnOutcome::Completed => self.counters.answered += 1,
            TurnOutcome::Retry => self.counters.retries += 1,
            TurnOutcome::Failed => self.counters.failures += 1,
            TurnOutcome::Ended => {}
        }

        self.record(exchange.user.clone());
        self.record(exchange.assistant.clone());

        Some(exchange)
    }

    fn record(&mut self, message: Message) {
        self.transcript.push(message.clone());
        self.publish(SessionEvent::Message(message));
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }

    fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            state: self.engine.state(),
            current_question: self.engine.current_question().map(|q| q.id.clone()),
            capturing: self.voice.is_capturing(),
            answered: self.counters.answered,
            retries: self.counters.retries,
            failures: self.counters.failures,
            messages: self.transcript.len(),
        }
    }
}

impl InterviewHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Start (or restart) the interview; returns the first question message
    pub async fn start_conversation(&self) -> Result<Message, SessionError> {
        self.request(Command::Start).await
    }

    /// Submit a typed answer. `Ok(None)` means it was ignored (empty, or no open question).
    pub async fn handle_response(&self, text: &str) -> Result<Option<Exchange>, SessionError> {
        let text = text.to_string();
        self.request(|reply| Command::Respond(text, reply)).await
    }

    /// Toggle voice capture; returns whether capture is running afterwards
    pub async fn toggle_voice(&self) -> Result<bool, SessionError> {
        Ok(self.request(Command::ToggleVoice).await??)
    }

    /// The open question, read without a round trip to the session
    pub fn current_question(&self) -> Option<Question> {
        self.question_rx.borrow().clone()
    }

    /// Observe transcript messages and capture changes from now on.
    ///
    /// Events arrive in order, but the channel holds at most 256 of them.
    /// A subscriber that falls further behind gets
    /// `RecvError::Lagged` and should resync with `transcript()`.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Transcript since the last start
    pub async fn transcript(&self) -> Result<Vec<Message>, SessionError> {
        self.request(Command::Transcript).await
    }

    pub async fn stats(&self) -> Result<SessionStats, SessionError> {
        self.request(Command::Stats).await
    }

    /// Stop capture and end the session task; returns final stats
    pub async fn shutdown(&self) -> Result<SessionStats, SessionError> {
        self.request(Command::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.commands.send(command(reply_tx)).await.map_err(|_| {
            warn!("Session {} is closed", self.session_id);
            SessionError::Closed
        })?;

        reply_rx.await.map_err(|_| SessionError::Closed)
    }
}
