use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::CaptureError;
use crate::nats::NatsClient;

/// Capacity of the event channel handed out by `SpeechSource::start`
pub const EVENT_BUFFER: usize = 64;

/// Incremental piece of a transcript pushed by a speech source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    /// Recognized text
    pub text: String,
    /// Final fragments are never revised; interim ones may be replaced
    pub is_final: bool,
    /// Result slot within the capture; revisions of one result share a slot
    pub sequence_index: u64,
}

impl TranscriptFragment {
    pub fn interim(text: impl Into<String>, sequence_index: u64) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            sequence_index,
        }
    }

    pub fn finalized(text: impl Into<String>, sequence_index: u64) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            sequence_index,
        }
    }
}

/// Events delivered by a speech source, strictly in arrival order.
///
/// Every successful `start()` is followed by exactly one `CaptureEnded`,
/// whether capture was stopped or ended on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    CaptureStarted,
    Fragment(TranscriptFragment),
    CaptureEnded,
    CaptureError(String),
}

/// Speech-to-text capture trait
///
/// Implementations:
/// - NATS: capture driven by an external STT service
/// - Scripted: fed in-process (tests, demos)
/// - Disabled: text-only mode, refuses to start
#[async_trait::async_trait]
pub trait SpeechSource: Send + Sync {
    /// Start capturing
    ///
    /// Returns a channel receiver that will receive speech events
    async fn start(&mut self) -> Result<mpsc::Receiver<SpeechEvent>, CaptureError>;

    /// Stop capturing. Safe to call repeatedly.
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Check if the source is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Speech source selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechSourceKind {
    /// STT service reached over NATS
    Nats,
    /// No voice input
    #[default]
    Disabled,
}

/// Speech source factory
pub struct SpeechSourceFactory;

impl SpeechSourceFactory {
    pub fn create(
        kind: SpeechSourceKind,
        session_id: &str,
        nats_client: Option<Arc<NatsClient>>,
    ) -> Result<Box<dyn SpeechSource>, CaptureError> {
        match kind {
            SpeechSourceKind::Nats => {
                let nats_client = nats_client.ok_or_else(|| {
                    CaptureError::Unavailable("NATS speech source needs a NATS connection".to_string())
                })?;
                Ok(Box::new(super::nats::NatsSpeechSource::new(
                    nats_client,
                    session_id.to_string(),
                )))
            }
            SpeechSourceKind::Disabled => Ok(Box::new(DisabledSpeechSource)),
        }
    }
}

/// Source for text-only sessions
pub struct DisabledSpeechSource;

#[async_trait::async_trait]
impl SpeechSource for DisabledSpeechSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<SpeechEvent>, CaptureError> {
        Err(CaptureError::Unavailable(
            "voice input is disabled for this session".to_string(),
        ))
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
