// Voice input controller
//
// Bridges the speech source and the utterance segmenter to the conversation
// engine. Capture is only allowed while the engine has an open question; the
// controller watches the engine's current question and force-stops capture
// the moment it goes away.
//
// Waiting and reacting are split: `next_signal()` only waits (cancel-safe, so
// it can sit in a select! next to other work) and `handle()` applies the
// signal.

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::questions::Question;
use crate::speech::{SpeechEvent, SpeechSource, UtteranceSegmenter};

/// Something the controller needs to react to
#[derive(Debug)]
pub enum VoiceSignal {
    /// The engine's current question changed
    QuestionChanged,
    /// Event from the speech source; `None` when its channel closed
    Speech(Option<SpeechEvent>),
    /// The silence deadline passed
    SilenceElapsed,
}

/// What a handled signal means for the session
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceUpdate {
    /// Capture began
    Started,
    /// Accumulated text so far, for live display
    LiveText(String),
    /// A complete utterance to submit as a response; capture has stopped
    Utterance(String),
    /// Capture ended without an utterance
    Stopped,
    /// Capture failed and was stopped
    Failed(CaptureError),
}

pub struct VoiceInputController {
    source: Box<dyn SpeechSource>,
    segmenter: UtteranceSegmenter,
    question_rx: watch::Receiver<Option<Question>>,
    engine_gone: bool,
    events: Option<mpsc::Receiver<SpeechEvent>>,
    capturing: bool,
}

impl VoiceInputController {
    pub fn new(
        source: Box<dyn SpeechSource>,
        segmenter: UtteranceSegmenter,
        question_rx: watch::Receiver<Option<Question>>,
    ) -> Self {
        Self {
            source,
            segmenter,
            question_rx,
            engine_gone: false,
            events: None,
            capturing: false,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Text accumulated in the current capture
    pub fn live_text(&self) -> String {
        self.segmenter.live_text()
    }

    fn has_question(&self) -> bool {
        self.question_rx.borrow().is_some()
    }

    /// Stop if capturing, otherwise start if a question is open.
    ///
    /// Returns whether capture is running afterwards.
    pub async fn toggle(&mut self) -> Result<bool, CaptureError> {
        if self.capturing {
            self.stop().await;
            return Ok(false);
        }

        if !self.has_question() {
            debug!("Not starting capture: no open question");
            return Ok(false);
        }

        self.segmenter.start();
        match self.source.start().await {
            Ok(events) => {
                info!("Voice capture started ({})", self.source.name());
                self.events = Some(events);
                self.capturing = true;
                Ok(true)
            }
            Err(e) => {
                warn!("Voice capture failed to start: {}", e);
                self.segmenter.stop();
                Err(e)
            }
        }
    }

    /// Stop capture and discard partial text. Safe to call repeatedly.
    pub async fn stop(&mut self) {
        self.segmenter.stop();
        self.events = None;

        if !self.capturing {
            return;
        }
        self.capturing = false;

        if let Err(e) = self.source.stop().await {
            warn!("Speech source {} failed to stop: {}", self.source.name(), e);
        }
        info!("Voice capture stopped");
    }

    /// Wait for the next thing to react to. Cancel-safe.
    pub async fn next_signal(&mut self) -> VoiceSignal {
        let engine_gone = self.engine_gone;
        let question_rx = &mut self.question_rx;
        let segmenter = &self.segmenter;
        let events = &mut self.events;

        tokio::select! {
            changed = question_rx.changed(), if !engine_gone => {
                if changed.is_err() {
                    self.engine_gone = true;
                }
                VoiceSignal::QuestionChanged
            }
            event = recv_event(events) => VoiceSignal::Speech(event),
            _ = segmenter.silence_elapsed() => VoiceSignal::SilenceElapsed,
        }
    }

    /// Apply a signal from `next_signal()`
    pub async fn handle(&mut self, signal: VoiceSignal) -> Option<VoiceUpdate> {
        match signal {
            VoiceSignal::QuestionChanged => {
                if self.capturing && (self.engine_gone || !self.has_question()) {
                    info!("No open question, stopping capture");
                    self.stop().await;
                    return Some(VoiceUpdate::Stopped);
                }
                None
            }

            VoiceSignal::Speech(None) => {
                let was_capturing = self.capturing;
                self.capturing = false;
                self.segmenter.stop();
                self.events = None;
                was_capturing.then_some(VoiceUpdate::Stopped)
            }

            VoiceSignal::Speech(Some(event)) => self.handle_event(event).await,

            VoiceSignal::SilenceElapsed => {
                let utterance = self.segmenter.expire();
                self.stop().await;
                Some(match utterance {
                    Some(text) => VoiceUpdate::Utterance(text),
                    None => VoiceUpdate::Stopped,
                })
            }
        }
    }

    async fn handle_event(&mut self, event: SpeechEvent) -> Option<VoiceUpdate> {
        match event {
            SpeechEvent::CaptureStarted => Some(VoiceUpdate::Started),

            SpeechEvent::Fragment(fragment) => {
                if !self.has_question() {
                    debug!("Fragment with no open question, stopping capture");
                    self.stop().await;
                    return Some(VoiceUpdate::Stopped);
                }
                self.segmenter.push(fragment);
                Some(VoiceUpdate::LiveText(self.segmenter.live_text()))
            }

            SpeechEvent::CaptureEnded => {
                // The source already stopped itself; partial text is dropped
                self.segmenter.stop();
                self.events = None;
                self.capturing = false;
                Some(VoiceUpdate::Stopped)
            }

            SpeechEvent::CaptureError(reason) => {
                warn!("Speech recognition error: {}", reason);
                self.stop().await;
                Some(VoiceUpdate::Failed(CaptureError::Recognition(reason)))
            }
        }
    }
}

async fn recv_event(events: &mut Option<mpsc::Receiver<SpeechEvent>>) -> Option<SpeechEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
