use serde::{Deserialize, Serialize};

/// How an answer to a question is judged by the local rule validator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationRule {
    /// Any non-empty answer
    #[default]
    Any,

    /// At least `count` words
    MinWords { count: usize },

    /// Between `min` and `max` digits; spoken digit words count
    Digits { min: usize, max: usize },

    /// A yes or no answer. With `end_on_no`, "no" ends the interview.
    YesNo {
        #[serde(default)]
        end_on_no: bool,
    },

    /// An email address, typed or spoken ("jane at example dot com")
    Email,

    /// One of a fixed set of options (case-insensitive)
    OneOf { options: Vec<String> },
}

/// A single interview question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier (e.g., "order_number")
    pub id: String,

    /// Text spoken and shown to the user
    pub text: String,

    /// Rule used to validate answers
    #[serde(default)]
    pub rule: ValidationRule,
}

/// A question as written in configuration, before the graph resolves successors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: String,

    pub text: String,

    #[serde(default)]
    pub rule: ValidationRule,

    /// Explicit successor. Defaults to the next definition in order.
    #[serde(default)]
    pub next: Option<String>,

    /// Ends the interview after this question even if definitions follow
    #[serde(default)]
    pub last: bool,
}

impl QuestionDefinition {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            rule: ValidationRule::Any,
            next: None,
            last: false,
        }
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn ending(mut self) -> Self {
        self.last = true;
        self
    }
}
