pub mod config;
pub mod conversation;
pub mod error;
pub mod http;
pub mod nats;
pub mod questions;
pub mod session;
pub mod speech;
pub mod validation;
pub mod voice;

pub use config::Config;
pub use conversation::{
    ConversationEngine, EngineState, Exchange, Message, Role, TurnOutcome, FALLBACK_MESSAGE,
};
pub use error::{CaptureError, ConfigurationError, SessionError, ValidationError};
pub use http::{create_router, AppState};
pub use nats::{NatsClient, TranscriptMessage};
pub use questions::{Question, QuestionDefinition, QuestionGraph, ValidationRule};
pub use session::{InterviewHandle, InterviewSession, SessionConfig, SessionEvent, SessionStats};
pub use speech::{
    NarrationMode, ScriptFeeder, ScriptedSpeechSource, SilentSink, SpeechEvent, SpeechSink,
    SpeechSource, SpeechSourceKind, TranscriptFragment, UtteranceSegmenter,
};
pub use validation::{ResponseValidator, RuleValidator, ValidationResult, ValidatorMessages};
pub use voice::{VoiceInputController, VoiceUpdate};
