use super::state::AppState;
use crate::conversation::{Exchange, Message};
use crate::error::SessionError;
use crate::questions::Question;
use crate::session::{InterviewHandle, InterviewSession, SessionConfig};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateInterviewRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub session_id: String,
    pub message: Message,
    pub current_question: Option<Question>,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RespondResponse {
    /// `null` when the answer was ignored (empty, or no open question)
    pub exchange: Option<Exchange>,
    pub current_question: Option<Question>,
}

#[derive(Debug, Serialize)]
pub struct VoiceResponse {
    pub capturing: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn session_error(session_id: &str, err: SessionError) -> Response {
    match err {
        SessionError::Closed => {
            error_response(StatusCode::GONE, format!("Interview {} has ended", session_id))
        }
        SessionError::Capture(e) => error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

async fn find_session(state: &AppState, session_id: &str) -> Result<InterviewHandle, Response> {
    state.session(session_id).await.ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Interview {} not found", session_id),
        )
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews
/// Create a session and ask the first question
pub async fn create_interview(
    State(state): State<AppState>,
    Json(req): Json<CreateInterviewRequest>,
) -> Response {
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("interview-{}", uuid::Uuid::new_v4()));

    info!("Creating interview: {}", session_id);

    if state.sessions.read().await.contains_key(&session_id) {
        return error_response(
            StatusCode::CONFLICT,
            format!("Interview {} already exists", session_id),
        );
    }

    let config = SessionConfig {
        session_id: session_id.clone(),
        ..state.session_defaults.clone()
    };

    let (session, handle) =
        match InterviewSession::build(config, state.graph.clone(), state.nats_client.clone()).await {
            Ok(built) => built,
            Err(e) => {
                error!("Failed to create session: {:#}", e);
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to create session: {}", e),
                );
            }
        };

    // Claim the id under one write lock
    match state.sessions.write().await.entry(session_id.clone()) {
        Entry::Occupied(_) => {
            return error_response(
                StatusCode::CONFLICT,
                format!("Interview {} already exists", session_id),
            );
        }
        Entry::Vacant(slot) => {
            slot.insert(handle.clone());
        }
    }
    session.spawn();

    let message = match handle.start_conversation().await {
        Ok(message) => message,
        Err(e) => {
            state.sessions.write().await.remove(&session_id);
            return session_error(&session_id, e);
        }
    };

    (
        StatusCode::CREATED,
        Json(StartInterviewResponse {
            session_id,
            message,
            current_question: handle.current_question(),
        }),
    )
        .into_response()
}

/// POST /interviews/:session_id/start
/// Restart an interview from the first question
pub async fn restart_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let handle = match find_session(&state, &session_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.start_conversation().await {
        Ok(message) => Json(StartInterviewResponse {
            session_id,
            message,
            current_question: handle.current_question(),
        })
        .into_response(),
        Err(e) => session_error(&session_id, e),
    }
}

/// POST /interviews/:session_id/respond
/// Submit a typed answer
pub async fn respond(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<RespondRequest>,
) -> Response {
    let handle = match find_session(&state, &session_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.handle_response(&req.text).await {
        Ok(exchange) => Json(RespondResponse {
            exchange,
            current_question: handle.current_question(),
        })
        .into_response(),
        Err(e) => session_error(&session_id, e),
    }
}

/// POST /interviews/:session_id/voice
/// Toggle voice capture
pub async fn toggle_voice(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let handle = match find_session(&state, &session_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.toggle_voice().await {
        Ok(capturing) => Json(VoiceResponse { capturing }).into_response(),
        Err(e) => session_error(&session_id, e),
    }
}

/// GET /interviews/:session_id
/// Get status of an interview
pub async fn get_interview_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let handle = match find_session(&state, &session_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => session_error(&session_id, e),
    }
}

/// GET /interviews/:session_id/transcript
/// Get the transcript since the last start
pub async fn get_interview_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let handle = match find_session(&state, &session_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.transcript().await {
        Ok(transcript) => Json(transcript).into_response(),
        Err(e) => session_error(&session_id, e),
    }
}

/// DELETE /interviews/:session_id
/// Shut an interview session down
pub async fn end_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let handle = state.sessions.write().await.remove(&session_id);

    match handle {
        Some(handle) => match handle.shutdown().await {
            Ok(stats) => {
                info!("Interview {} ended", session_id);
                Json(stats).into_response()
            }
            Err(e) => session_error(&session_id, e),
        },
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Interview {} not found", session_id),
        ),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
