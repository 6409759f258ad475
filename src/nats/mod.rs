pub mod client;
pub mod messages;

pub use client::NatsClient;
pub use messages::{
    CaptureAction, CaptureControlMessage, SpeakMessage, TranscriptMessage, ValidationReply,
    ValidationRequest,
};
