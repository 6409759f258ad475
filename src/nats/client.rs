use anyhow::{Context, Result};
use async_nats::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::messages::{CaptureAction, CaptureControlMessage, SpeakMessage};

/// Subject the STT service publishes partial and final transcripts on
pub const TRANSCRIPT_SUBJECT: &str = "stt.text.>";

pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    /// Ask the STT service to start or stop capturing for a session
    pub async fn publish_capture_control(&self, session_id: &str, action: CaptureAction) -> Result<()> {
        let subject = format!("stt.control.{}", session_id);

        let message = CaptureControlMessage {
            session_id: session_id.to_string(),
            action,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        self.publish_json(subject, &message)
            .await
            .context("Failed to publish capture control")
    }

    /// Subscribe to transcript messages
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        // Partial and final results arrive on stt.text.partial and stt.text.final;
        // callers filter by session_id in the payload
        info!("Subscribing to transcripts on {}", TRANSCRIPT_SUBJECT);

        let subscriber = self
            .client
            .subscribe(TRANSCRIPT_SUBJECT.to_string())
            .await
            .context("Failed to subscribe to transcripts")?;

        info!("Subscribed to {}", TRANSCRIPT_SUBJECT);

        Ok(subscriber)
    }

    /// Hand text to the TTS service.
    ///
    /// With `await_playback` this is a request/reply that resolves once the
    /// TTS service acknowledges playback finished.
    pub async fn speak(&self, session_id: &str, text: &str, await_playback: bool) -> Result<()> {
        let subject = format!("tts.speak.{}", session_id);

        let message = SpeakMessage {
            session_id: session_id.to_string(),
            text: text.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        if await_playback {
            self.request_json(subject, &message)
                .await
                .context("TTS playback request failed")?;
        } else {
            self.publish_json(subject, &message)
                .await
                .context("Failed to publish speech")?;
        }

        Ok(())
    }

    /// Request/reply with a JSON body; returns the raw reply payload
    pub async fn request_json<T: Serialize>(&self, subject: String, body: &T) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(body)?;

        let reply = self
            .client
            .request(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Request to {} failed", subject))?;

        debug!("Reply from {} ({} bytes)", subject, reply.payload.len());

        Ok(reply.payload.to_vec())
    }

    async fn publish_json<T: Serialize>(&self, subject: String, body: &T) -> Result<()> {
        let payload = serde_json::to_vec(body)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to {}", subject))?;

        debug!("Published to {}", subject);

        Ok(())
    }
}
