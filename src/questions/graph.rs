use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use super::question::{Question, QuestionDefinition, ValidationRule};
use crate::error::ConfigurationError;

/// Static forward structure of interview questions.
///
/// Built once from definitions and validated up front: ids are unique,
/// every successor exists, no question points to itself, the chain from the
/// first question terminates, and every question lies on that chain. After
/// construction lookups cannot fail for ids that came out of the graph.
#[derive(Debug, Clone)]
pub struct QuestionGraph {
    questions: HashMap<String, Question>,
    successors: HashMap<String, Option<String>>,
    /// Question ids in asking order, first to last
    chain: Vec<String>,
}

impl QuestionGraph {
    pub fn new(definitions: Vec<QuestionDefinition>) -> Result<Self, ConfigurationError> {
        if definitions.is_empty() {
            return Err(ConfigurationError::Empty);
        }

        let mut questions = HashMap::with_capacity(definitions.len());
        let mut successors = HashMap::with_capacity(definitions.len());

        for (position, def) in definitions.iter().enumerate() {
            if def.id.trim().is_empty() {
                return Err(ConfigurationError::BlankId(position));
            }
            if def.text.trim().is_empty() {
                return Err(ConfigurationError::BlankText(def.id.clone()));
            }
            if let Some(reason) = rule_problem(&def.rule) {
                return Err(ConfigurationError::InvalidRule {
                    id: def.id.clone(),
                    reason,
                });
            }

            let next = match &def.next {
                Some(next) => Some(next.clone()),
                None if def.last => None,
                None => definitions.get(position + 1).map(|d| d.id.clone()),
            };

            let question = Question {
                id: def.id.clone(),
                text: def.text.clone(),
                rule: def.rule.clone(),
            };

            if questions.insert(def.id.clone(), question).is_some() {
                return Err(ConfigurationError::DuplicateId(def.id.clone()));
            }
            successors.insert(def.id.clone(), next);
        }

        for def in &definitions {
            if let Some(Some(next)) = successors.get(&def.id) {
                if *next == def.id {
                    return Err(ConfigurationError::SelfReference(def.id.clone()));
                }
                if !questions.contains_key(next) {
                    return Err(ConfigurationError::UnknownNext {
                        from: def.id.clone(),
                        to: next.clone(),
                    });
                }
            }
        }

        let first = definitions[0].id.clone();
        let mut chain = Vec::with_capacity(definitions.len());
        let mut visited = HashSet::new();
        let mut cursor = Some(first);

        while let Some(id) = cursor {
            if !visited.insert(id.clone()) {
                return Err(ConfigurationError::Cycle(id));
            }
            cursor = successors.get(&id).cloned().flatten();
            chain.push(id);
        }

        if let Some(orphan) = definitions.iter().find(|d| !visited.contains(&d.id)) {
            return Err(ConfigurationError::Unreachable(orphan.id.clone()));
        }

        debug!("Question chain: {}", chain.join(" -> "));
        info!("Question graph loaded: {} questions", chain.len());

        Ok(Self {
            questions,
            successors,
            chain,
        })
    }

    /// The designated first question
    pub fn first_question(&self) -> &Question {
        &self.questions[&self.chain[0]]
    }

    /// Successor of `current_id`, or `None` at the end of the interview
    /// (also `None` for ids the graph does not know).
    pub fn next_question(&self, current_id: &str) -> Option<&Question> {
        self.successors
            .get(current_id)?
            .as_ref()
            .and_then(|next| self.questions.get(next))
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.get(id)
    }

    /// Questions in asking order
    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.chain.iter().map(|id| &self.questions[id])
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false for a constructed graph
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

/// Why no answer could ever satisfy `rule`, if that is the case
fn rule_problem(rule: &ValidationRule) -> Option<String> {
    match rule {
        ValidationRule::MinWords { count: 0 } => Some("min_words count must be at least 1".to_string()),
        ValidationRule::Digits { min, max } if min > max => {
            Some(format!("digits min {} is greater than max {}", min, max))
        }
        ValidationRule::Digits { max: 0, .. } => Some("digits max must be at least 1".to_string()),
        ValidationRule::OneOf { options } if options.is_empty() => {
            Some("one_of needs at least one option".to_string())
        }
        ValidationRule::OneOf { options } if options.iter().any(|o| o.trim().is_empty()) => {
            Some("one_of options must not be blank".to_string())
        }
        _ => None,
    }
}
