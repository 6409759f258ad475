use crate::nats::NatsClient;
use crate::questions::QuestionGraph;
use crate::session::{InterviewHandle, SessionConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Running interview sessions (session_id → handle)
    pub sessions: Arc<RwLock<HashMap<String, InterviewHandle>>>,

    /// Question graph shared by every session
    pub graph: Arc<QuestionGraph>,

    /// Settings new sessions start from (session_id is replaced per session)
    pub session_defaults: SessionConfig,

    /// Shared NATS connection, when any collaborator uses NATS
    pub nats_client: Option<Arc<NatsClient>>,
}

impl AppState {
    pub fn new(
        graph: Arc<QuestionGraph>,
        session_defaults: SessionConfig,
        nats_client: Option<Arc<NatsClient>>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            graph,
            session_defaults,
            nats_client,
        }
    }

    pub async fn session(&self, session_id: &str) -> Option<InterviewHandle> {
        self.sessions.read().await.get(session_id).cloned()
    }
}
