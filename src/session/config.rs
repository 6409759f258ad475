use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::speech::{NarrationMode, SpeechSourceKind, DEFAULT_SILENCE_DELAY};
use crate::validation::ValidatorMessages;

/// Which validator judges answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorKind {
    /// Per-question rules, in-process
    #[default]
    Rules,
    /// External checker over NATS request/reply
    Nats,
}

/// Configuration for an interview session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "interview-3f2a...")
    pub session_id: String,

    /// Quiet interval that completes a spoken answer
    /// Default: 1000 ms
    pub silence_delay: Duration,

    /// Where spoken answers come from
    pub speech_source: SpeechSourceKind,

    /// Who judges answers
    pub validator: ValidatorKind,

    /// Where assistant replies are spoken
    pub narration: NarrationMode,

    /// Wait for the TTS service to finish playback before completing a turn
    pub await_playback: bool,

    /// Replies used by the rule validator
    pub messages: ValidatorMessages,

    /// NATS server URL
    pub nats_url: String,

    /// Subject for external validation requests
    pub validation_subject: String,

    /// Bound on NATS round trips (validation, playback)
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("interview-{}", uuid::Uuid::new_v4()),
            silence_delay: DEFAULT_SILENCE_DELAY,
            speech_source: SpeechSourceKind::Disabled,
            validator: ValidatorKind::Rules,
            narration: NarrationMode::Silent,
            await_playback: false,
            messages: ValidatorMessages::default(),
            nats_url: "nats://localhost:4222".to_string(),
            validation_subject: "interview.validate".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl SessionConfig {
    /// Whether any collaborator of this session talks to NATS
    pub fn needs_nats(&self) -> bool {
        self.speech_source == SpeechSourceKind::Nats
            || self.validator == ValidatorKind::Nats
            || self.narration == NarrationMode::Nats
    }
}
