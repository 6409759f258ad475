//! HTTP API server for a UI shell
//!
//! This module provides a REST API over interview sessions:
//! - POST /interviews - Create a session and ask the first question
//! - POST /interviews/:id/start - Restart from the first question
//! - POST /interviews/:id/respond - Submit a typed answer
//! - POST /interviews/:id/voice - Toggle voice capture
//! - GET /interviews/:id - Query session status
//! - GET /interviews/:id/transcript - Get the transcript
//! - DELETE /interviews/:id - End the session
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
