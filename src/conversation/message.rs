use serde::{Deserialize, Serialize};

/// Who produced a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

/// One entry of the visible transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }
}

/// How a turn moved the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Valid answer, moved on to `next`
    Advanced { next: String },
    /// Invalid answer, same question again
    Retry,
    /// Valid answer to the last question
    Completed,
    /// The validator ended the interview
    Ended,
    /// The validator failed; same question again
    Failed,
}

impl TurnOutcome {
    /// Whether the conversation is idle after this turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnOutcome::Completed | TurnOutcome::Ended)
    }
}

/// The pair of messages a single response appends, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: Message,
    pub assistant: Message,
    pub outcome: TurnOutcome,
}

impl Exchange {
    pub fn messages(&self) -> [&Message; 2] {
        [&self.user, &self.assistant]
    }
}
