//! Error taxonomy for the interview core.
//!
//! Only `ConfigurationError` is fatal. Everything else is caught at the
//! boundary where it happens and turned into a fallback message or a no-op.

use std::time::Duration;

/// Malformed question graph, detected once at construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("question graph has no questions")]
    Empty,
    #[error("duplicate question id: {0}")]
    DuplicateId(String),
    #[error("question at position {0} has a blank id")]
    BlankId(usize),
    #[error("question {0} has blank text")]
    BlankText(String),
    #[error("question {from} points to unknown question {to}")]
    UnknownNext { from: String, to: String },
    #[error("question {0} refers to itself")]
    SelfReference(String),
    #[error("question chain revisits {0}")]
    Cycle(String),
    #[error("question {0} is not reachable from the first question")]
    Unreachable(String),
    #[error("question {id} has an unusable rule: {reason}")]
    InvalidRule { id: String, reason: String },
}

/// The validator could not judge a response.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown question: {0}")]
    UnknownQuestion(String),
    #[error("validation service error: {0}")]
    Remote(String),
    #[error("validation timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed validation reply: {0}")]
    Malformed(String),
}

/// Speech source failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("speech capture unavailable: {0}")]
    Unavailable(String),
    #[error("speech capture already active")]
    AlreadyCapturing,
    #[error("speech transport error: {0}")]
    Transport(String),
    #[error("speech recognition error: {0}")]
    Recognition(String),
}

/// Failure talking to a running interview session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("interview session is closed")]
    Closed,
    #[error(transparent)]
    Capture(#[from] CaptureError),
}
