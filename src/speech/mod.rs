//! Speech input and output collaborators
//!
//! - `SpeechSource`: transcript fragments in (NATS STT, scripted, disabled)
//! - `UtteranceSegmenter`: fragments to utterances by silence timeout
//! - `SpeechSink`: narration out (NATS TTS, silent)

pub mod nats;
pub mod scripted;
pub mod segmenter;
pub mod source;
pub mod synthesis;

pub use nats::NatsSpeechSource;
pub use scripted::{ScriptFeeder, ScriptedSpeechSource};
pub use segmenter::{UtteranceSegmenter, DEFAULT_SILENCE_DELAY};
pub use source::{
    DisabledSpeechSource, SpeechEvent, SpeechSource, SpeechSourceFactory, SpeechSourceKind,
    TranscriptFragment,
};
pub use synthesis::{NarrationMode, NatsSpeechSink, SilentSink, SpeechSink};
