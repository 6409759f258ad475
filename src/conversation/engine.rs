//! Conversation state machine.
//!
//! The engine owns the current question and nothing else:
//! - `Idle`: no current question (before the first start, or after the end)
//! - `AwaitingResponse`: a question is open for an answer
//!
//! `start()` always (re)opens the first question. `respond()` asks the
//! validator about the answer and either moves on, stays on the same
//! question, or goes back to `Idle`. The current question is published on a
//! watch channel so input collaborators can react when it disappears.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::message::{Exchange, Message, TurnOutcome};
use crate::questions::{Question, QuestionGraph};
use crate::speech::SpeechSink;
use crate::validation::ResponseValidator;

/// Assistant reply when the validator fails
pub const FALLBACK_MESSAGE: &str = "I'm having trouble processing that. Could you please try again?";

/// Coarse engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    AwaitingResponse,
}

pub struct ConversationEngine {
    graph: Arc<QuestionGraph>,
    validator: Arc<dyn ResponseValidator>,
    speech: Arc<dyn SpeechSink>,
    current: Option<Question>,
    question_tx: watch::Sender<Option<Question>>,
}

impl ConversationEngine {
    pub fn new(
        graph: Arc<QuestionGraph>,
        validator: Arc<dyn ResponseValidator>,
        speech: Arc<dyn SpeechSink>,
    ) -> Self {
        let (question_tx, _) = watch::channel(None);

        Self {
            graph,
            validator,
            speech,
            current: None,
            question_tx,
        }
    }

    /// Open the first question, discarding any interview in progress.
    ///
    /// Returns the assistant message carrying the question text.
    pub async fn start(&mut self) -> Message {
        let first = self.graph.first_question().clone();

        if let Some(previous) = &self.current {
            info!("Restarting interview (was on {})", previous.id);
        } else {
            info!("Starting interview at {}", first.id);
        }

        let message = Message::assistant(first.text.clone());
        self.set_current(Some(first));
        self.narrate(&message.text).await;

        message
    }

    /// Submit an answer to the current question.
    ///
    /// Returns `None` without doing anything if no question is open or the
    /// text is empty after trimming. Otherwise returns the user message and
    /// the assistant reply, in transcript order.
    pub async fn respond(&mut self, text: &str) -> Option<Exchange> {
        if text.trim().is_empty() {
            debug!("Ignoring empty response");
            return None;
        }
        let question = self.current.clone()?;

        let result = match self.validator.validate(&question.id, text).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "Validator {} failed on {}: {}",
                    self.validator.name(),
                    question.id,
                    e
                );
                self.narrate(FALLBACK_MESSAGE).await;
                return Some(Exchange {
                    user: Message::user(text),
                    assistant: Message::assistant(FALLBACK_MESSAGE),
                    outcome: TurnOutcome::Failed,
                });
            }
        };

        self.narrate(&result.message).await;

        let outcome = if result.end_chat {
            info!("Interview ended by validator at {}", question.id);
            self.set_current(None);
            TurnOutcome::Ended
        } else if result.is_valid {
            match self.graph.next_question(&question.id).cloned() {
                Some(next) => {
                    info!("Advancing {} -> {}", question.id, next.id);
                    let next_id = next.id.clone();
                    self.set_current(Some(next));
                    TurnOutcome::Advanced { next: next_id }
                }
                None => {
                    info!("Interview complete after {}", question.id);
                    self.set_current(None);
                    TurnOutcome::Completed
                }
            }
        } else {
            debug!("Answer to {} rejected, asking again", question.id);
            TurnOutcome::Retry
        };

        Some(Exchange {
            user: Message::user(text),
            assistant: Message::assistant(result.message),
            outcome,
        })
    }

    /// The open question, if any
    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn state(&self) -> EngineState {
        if self.current.is_some() {
            EngineState::AwaitingResponse
        } else {
            EngineState::Idle
        }
    }

    /// Observe the current question as it changes
    pub fn subscribe(&self) -> watch::Receiver<Option<Question>> {
        self.question_tx.subscribe()
    }

    pub fn graph(&self) -> &QuestionGraph {
        &self.graph
    }

    fn set_current(&mut self, question: Option<Question>) {
        self.current = question.clone();
        self.question_tx.send_replace(question);
    }

    async fn narrate(&self, text: &str) {
        if let Err(e) = self.speech.speak(text).await {
            warn!("Speech sink {} failed: {:#}", self.speech.name(), e);
        }
    }
}
