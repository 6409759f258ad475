use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::EngineState;

/// Statistics about an interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Engine state right now
    pub state: EngineState,

    /// Id of the open question, if any
    pub current_question: Option<String>,

    /// Whether voice capture is running
    pub capturing: bool,

    /// Answers accepted since the last start
    pub answered: usize,

    /// Answers rejected since the last start
    pub retries: usize,

    /// Turns where the validator failed since the last start
    pub failures: usize,

    /// Transcript length
    pub messages: usize,
}
