//! Interview session management
//!
//! This module provides the `InterviewSession` abstraction that manages:
//! - The conversation engine and its collaborators (validator, narration)
//! - Voice capture through the voice input controller
//! - The visible transcript and its observers
//! - Session statistics
//!
//! A session runs as one task; `InterviewHandle` is the API the UI talks to.

mod config;
mod session;
mod stats;

pub use config::{SessionConfig, ValidatorKind};
pub use session::{InterviewHandle, InterviewSession, SessionEvent};
pub use stats::SessionStats;
