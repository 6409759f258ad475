use serde::{Deserialize, Serialize};

/// Transcript message received from STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Result slot within the capture; interim revisions share a slot
    #[serde(default)]
    pub segment: u64,
}

/// Capture control action sent to the STT service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureAction {
    Start,
    Stop,
}

/// Capture control message published to the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureControlMessage {
    pub session_id: String,
    pub action: CaptureAction,
    pub timestamp: String, // RFC3339 timestamp
}

/// Text published to the TTS service for playback
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeakMessage {
    pub session_id: String,
    pub text: String,
    pub timestamp: String, // RFC3339 timestamp
}

/// Validation request sent to an external checker
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub session_id: String,
    pub question_id: String,
    pub text: String,
}

/// Reply from an external checker
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationReply {
    pub is_valid: bool,
    pub message: String,
    #[serde(default)]
    pub end_chat: bool,
}
