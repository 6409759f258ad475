//! Conversation engine and transcript types

mod engine;
mod message;

pub use engine::{ConversationEngine, EngineState, FALLBACK_MESSAGE};
pub use message::{Exchange, Message, Role, TurnOutcome};
