// In-process speech source driven through a ScriptFeeder handle

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::debug;

use super::source::{SpeechEvent, SpeechSource, TranscriptFragment, EVENT_BUFFER};
use crate::error::CaptureError;

#[derive(Default)]
struct ScriptState {
    tx: Option<mpsc::Sender<SpeechEvent>>,
    starts: usize,
    stops: usize,
    fail_next_start: Option<CaptureError>,
}

fn lock(state: &Mutex<ScriptState>) -> MutexGuard<'_, ScriptState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Speech source whose fragments come from a paired `ScriptFeeder`
pub struct ScriptedSpeechSource {
    state: Arc<Mutex<ScriptState>>,
}

/// Pushes events into the capture of a `ScriptedSpeechSource`
#[derive(Clone)]
pub struct ScriptFeeder {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedSpeechSource {
    pub fn new() -> (Self, ScriptFeeder) {
        let state = Arc::new(Mutex::new(ScriptState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            ScriptFeeder { state },
        )
    }
}

#[async_trait::async_trait]
impl SpeechSource for ScriptedSpeechSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<SpeechEvent>, CaptureError> {
        let mut state = lock(&self.state);
        if state.tx.is_some() {
            return Err(CaptureError::AlreadyCapturing);
        }
        if let Some(err) = state.fail_next_start.take() {
            return Err(err);
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let _ = tx.try_send(SpeechEvent::CaptureStarted);
        state.tx = Some(tx);
        state.starts += 1;

        debug!("Scripted capture started (#{})", state.starts);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        let mut state = lock(&self.state);
        if let Some(tx) = state.tx.take() {
            let _ = tx.try_send(SpeechEvent::CaptureEnded);
            state.stops += 1;
            debug!("Scripted capture stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        lock(&self.state).tx.is_some()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

impl ScriptFeeder {
    /// Deliver a fragment to the running capture. Returns false when nothing is capturing.
    pub async fn send(&self, fragment: TranscriptFragment) -> bool {
        self.deliver(SpeechEvent::Fragment(fragment)).await
    }

    pub async fn interim(&self, text: &str, sequence_index: u64) -> bool {
        self.send(TranscriptFragment::interim(text, sequence_index)).await
    }

    pub async fn finalized(&self, text: &str, sequence_index: u64) -> bool {
        self.send(TranscriptFragment::finalized(text, sequence_index)).await
    }

    /// Report a recognition failure, then end the capture
    pub async fn fail(&self, reason: &str) -> bool {
        let delivered = self
            .deliver(SpeechEvent::CaptureError(reason.to_string()))
            .await;
        self.finish().await;
        delivered
    }

    /// End the capture as if the recognizer stopped on its own
    pub async fn finish(&self) {
        let tx = lock(&self.state).tx.take();
        if let Some(tx) = tx {
            let _ = tx.send(SpeechEvent::CaptureEnded).await;
        }
    }

    /// Make the next `start()` fail with `err`
    pub fn fail_next_start(&self, err: CaptureError) {
        lock(&self.state).fail_next_start = Some(err);
    }

    pub fn is_capturing(&self) -> bool {
        lock(&self.state).tx.is_some()
    }

    /// Number of successful starts
    pub fn starts(&self) -> usize {
        lock(&self.state).starts
    }

    /// Number of explicit stops that ended a capture
    pub fn stops(&self) -> usize {
        lock(&self.state).stops
    }

    async fn deliver(&self, event: SpeechEvent) -> bool {
        let tx = lock(&self.state).tx.clone();
        match tx {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }
}
