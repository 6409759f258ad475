use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Interview lifecycle
        .route("/interviews", post(handlers::create_interview))
        .route(
            "/interviews/:session_id",
            get(handlers::get_interview_status).delete(handlers::end_interview),
        )
        .route(
            "/interviews/:session_id/start",
            post(handlers::restart_interview),
        )
        // Answers
        .route("/interviews/:session_id/respond", post(handlers::respond))
        .route("/interviews/:session_id/voice", post(handlers::toggle_voice))
        .route(
            "/interviews/:session_id/transcript",
            get(handlers::get_interview_transcript),
        )
        // Request logging, and a browser UI may live on another origin
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
