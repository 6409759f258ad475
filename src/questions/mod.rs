//! Interview questions and the graph that orders them

mod graph;
mod question;

pub use graph::QuestionGraph;
pub use question::{Question, QuestionDefinition, ValidationRule};
