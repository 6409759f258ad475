use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Verdict on a single response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the answer satisfies the question
    pub is_valid: bool,

    /// Assistant reply for the user (usually carries the next question)
    pub message: String,

    /// The interview should end now, whatever `is_valid` says
    pub end_chat: bool,
}

impl ValidationResult {
    pub fn accept(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
            end_chat: false,
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
            end_chat: false,
        }
    }

    pub fn end(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
            end_chat: true,
        }
    }
}

/// Judges answers to questions.
///
/// Implementations may suspend (e.g. call an external service). Callers never
/// pass text that is empty after trimming.
#[async_trait::async_trait]
pub trait ResponseValidator: Send + Sync {
    async fn validate(
        &self,
        question_id: &str,
        raw_text: &str,
    ) -> Result<ValidationResult, ValidationError>;

    /// Validator name for logging
    fn name(&self) -> &str;
}
