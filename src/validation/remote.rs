use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::validator::{ResponseValidator, ValidationResult};
use crate::error::ValidationError;
use crate::nats::{NatsClient, ValidationReply, ValidationRequest};

/// Validator backed by an external checker reached over NATS request/reply
pub struct NatsValidator {
    nats_client: Arc<NatsClient>,
    session_id: String,
    subject: String,
    timeout: Duration,
}

impl NatsValidator {
    pub fn new(
        nats_client: Arc<NatsClient>,
        session_id: String,
        subject: String,
        timeout: Duration,
    ) -> Self {
        Self {
            nats_client,
            session_id,
            subject,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl ResponseValidator for NatsValidator {
    async fn validate(
        &self,
        question_id: &str,
        raw_text: &str,
    ) -> Result<ValidationResult, ValidationError> {
        let request = ValidationRequest {
            session_id: self.session_id.clone(),
            question_id: question_id.to_string(),
            text: raw_text.to_string(),
        };

        debug!("Requesting validation of {} on {}", question_id, self.subject);

        let payload = tokio::time::timeout(
            self.timeout,
            self.nats_client.request_json(self.subject.clone(), &request),
        )
        .await
        .map_err(|_| ValidationError::Timeout(self.timeout))?
        .map_err(|e| {
            warn!("Validation request failed: {:#}", e);
            ValidationError::Remote(e.to_string())
        })?;

        let reply: ValidationReply = serde_json::from_slice(&payload)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;

        Ok(ValidationResult {
            is_valid: reply.is_valid,
            message: reply.message,
            end_chat: reply.end_chat,
        })
    }

    fn name(&self) -> &str {
        "nats"
    }
}
