// Local, rule-based response validation
//
// Each question carries a ValidationRule. Answers are normalized for speech
// first: spoken digits ("four one five") count as digits, spoken email
// addresses ("jane at example dot com") are collapsed, and stop phrases end
// the interview from any question.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::validator::{ResponseValidator, ValidationResult};
use crate::error::ValidationError;
use crate::questions::{QuestionGraph, ValidationRule};

/// Fixed replies used by the rule validator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorMessages {
    /// Prefix for accepted answers, followed by the next question
    pub acknowledgement: String,

    /// Reply to the last accepted answer
    pub completion: String,

    /// Reply when a yes/no question with `end_on_no` is answered "no"
    pub declined: String,

    /// Reply to a stop phrase
    pub stopped: String,

    /// Whole utterances that end the interview
    pub stop_phrases: Vec<String>,
}

impl Default for ValidatorMessages {
    fn default() -> Self {
        Self {
            acknowledgement: "Thank you.".to_string(),
            completion: "Thank you, your verification is complete. Goodbye!".to_string(),
            declined: "No problem. Please contact our support team to update your details. Goodbye!"
                .to_string(),
            stopped: "Okay, we'll stop the verification here. Goodbye!".to_string(),
            stop_phrases: ["stop", "quit", "cancel", "exit", "goodbye", "end chat"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleOutcome {
    Accepted,
    Rejected(String),
    Declined,
}

/// Validator that applies each question's `ValidationRule` in-process
pub struct RuleValidator {
    graph: Arc<QuestionGraph>,
    messages: ValidatorMessages,
    stop_phrases: Vec<String>,
}

impl RuleValidator {
    pub fn new(graph: Arc<QuestionGraph>, messages: ValidatorMessages) -> Self {
        let stop_phrases = messages
            .stop_phrases
            .iter()
            .map(|phrase| words(phrase).join(" "))
            .filter(|phrase| !phrase.is_empty())
            .collect();

        Self {
            graph,
            messages,
            stop_phrases,
        }
    }

    fn is_stop_intent(&self, answer: &str) -> bool {
        let normalized = words(answer).join(" ");
        self.stop_phrases.iter().any(|phrase| *phrase == normalized)
    }
}

#[async_trait::async_trait]
impl ResponseValidator for RuleValidator {
    async fn validate(
        &self,
        question_id: &str,
        raw_text: &str,
    ) -> Result<ValidationResult, ValidationError> {
        if self.is_stop_intent(raw_text) {
            debug!("Stop phrase on question {}", question_id);
            return Ok(ValidationResult::end(self.messages.stopped.clone()));
        }

        let question = self
            .graph
            .get(question_id)
            .ok_or_else(|| ValidationError::UnknownQuestion(question_id.to_string()))?;

        let result = match check(&question.rule, raw_text) {
            RuleOutcome::Accepted => match self.graph.next_question(question_id) {
                Some(next) => {
                    ValidationResult::accept(format!("{} {}", self.messages.acknowledgement, next.text))
                }
                None => ValidationResult::accept(self.messages.completion.clone()),
            },
            RuleOutcome::Rejected(hint) => {
                ValidationResult::reject(format!("{} {}", hint, question.text))
            }
            RuleOutcome::Declined => ValidationResult {
                is_valid: true,
                message: self.messages.declined.clone(),
                end_chat: true,
            },
        };

        debug!(
            "Question {} judged: valid={}, end={}",
            question_id, result.is_valid, result.end_chat
        );

        Ok(result)
    }

    fn name(&self) -> &str {
        "rules"
    }
}

fn check(rule: &ValidationRule, answer: &str) -> RuleOutcome {
    match rule {
        ValidationRule::Any => RuleOutcome::Accepted,

        ValidationRule::MinWords { count } => {
            if answer.split_whitespace().count() >= *count {
                RuleOutcome::Accepted
            } else {
                RuleOutcome::Rejected("Could you give me a little more detail?".to_string())
            }
        }

        ValidationRule::Digits { min, max } => {
            let digits = spoken_digits(answer);
            if (*min..=*max).contains(&digits.len()) {
                RuleOutcome::Accepted
            } else if min == max {
                RuleOutcome::Rejected(format!("I need exactly {} digits.", min))
            } else {
                RuleOutcome::Rejected(format!("I need between {} and {} digits.", min, max))
            }
        }

        ValidationRule::YesNo { end_on_no } => {
            let (yes, no) = yes_no(&words(answer));
            match (yes, no) {
                (true, false) => RuleOutcome::Accepted,
                (false, true) if *end_on_no => RuleOutcome::Declined,
                (false, true) => RuleOutcome::Accepted,
                _ => RuleOutcome::Rejected("Please answer yes or no.".to_string()),
            }
        }

        ValidationRule::Email => {
            if is_email(&spoken_email(answer)) {
                RuleOutcome::Accepted
            } else {
                RuleOutcome::Rejected("That doesn't sound like an email address.".to_string())
            }
        }

        ValidationRule::OneOf { options } => {
            let normalized = words(answer).join(" ");
            let matched = options
                .iter()
                .map(|option| words(option).join(" "))
                .any(|option| !option.is_empty() && contains_phrase(&normalized, &option));
            if matched {
                RuleOutcome::Accepted
            } else {
                RuleOutcome::Rejected(format!("Please choose one of: {}.", options.join(", ")))
            }
        }
    }
}

const YES_WORDS: &[&str] = &["yes", "yeah", "yep", "yup", "correct", "right", "sure", "affirmative"];
const NO_WORDS: &[&str] = &["no", "nope", "nah", "incorrect", "wrong", "negative"];

/// How many preceding words a negator reaches ("not quite right")
const NEGATION_REACH: usize = 2;

fn is_negator(word: &str) -> bool {
    matches!(word, "not" | "never") || word.ends_with("n't")
}

/// Whether the answer says yes and whether it says no.
/// A negated yes word ("not correct") counts as no, a negated no word as yes.
fn yes_no(words: &[String]) -> (bool, bool) {
    let mut yes = false;
    let mut no = false;

    for (position, word) in words.iter().enumerate() {
        let negated = words[position.saturating_sub(NEGATION_REACH)..position]
            .iter()
            .any(|w| is_negator(w));

        if YES_WORDS.contains(&word.as_str()) {
            if negated {
                no = true;
            } else {
                yes = true;
            }
        } else if NO_WORDS.contains(&word.as_str()) {
            if negated {
                yes = true;
            } else {
                no = true;
            }
        }
    }

    (yes, no)
}

/// Lowercased words with surrounding punctuation stripped
fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    format!(" {} ", haystack).contains(&format!(" {} ", phrase))
}

/// Digits from an answer, accepting spoken digit words
fn spoken_digits(answer: &str) -> String {
    let mut digits = String::new();
    for token in answer.split(|c: char| c.is_whitespace() || c == '-' || c == ',') {
        let word = token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        let spoken = match word.as_str() {
            "zero" | "oh" => Some('0'),
            "one" => Some('1'),
            "two" => Some('2'),
            "three" => Some('3'),
            "four" => Some('4'),
            "five" => Some('5'),
            "six" => Some('6'),
            "seven" => Some('7'),
            "eight" => Some('8'),
            "nine" => Some('9'),
            _ => None,
        };
        match spoken {
            Some(digit) => digits.push(digit),
            None => digits.extend(word.chars().filter(|c| c.is_ascii_digit())),
        }
    }
    digits
}

/// Collapse a spoken address ("jane at example dot com") into its written form
fn spoken_email(answer: &str) -> String {
    // "at" and "dot" glue their neighbours; other words stay apart
    let mut written = String::new();
    let mut glued = true;
    for word in answer.split_whitespace() {
        let word = word.to_lowercase();
        match word.trim_end_matches(['.', ',', '!', '?']) {
            "at" => {
                written.push('@');
                glued = true;
            }
            "dot" => {
                written.push('.');
                glued = true;
            }
            other => {
                if !glued {
                    written.push(' ');
                }
                written.push_str(other);
                glued = false;
            }
        }
    }

    // Only the word that holds the address ("my email is jane at ...")
    let address = written.split(' ').find(|token| token.contains('@'));
    address.unwrap_or(&written).to_string()
}

fn is_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}
