use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::nats::NatsClient;

/// Text-to-speech output.
///
/// The engine awaits `speak` before finishing a turn, so implementations
/// should resolve when playback is done (or immediately if they don't track it).
#[async_trait::async_trait]
pub trait SpeechSink: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;

    /// Sink name for logging
    fn name(&self) -> &str;
}

/// Narration selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrationMode {
    /// Text only
    #[default]
    Silent,
    /// TTS service reached over NATS
    Nats,
}

/// Sink for text-only mode
pub struct SilentSink;

#[async_trait::async_trait]
impl SpeechSink for SilentSink {
    async fn speak(&self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// Sink that hands text to a TTS service over NATS
pub struct NatsSpeechSink {
    nats_client: Arc<NatsClient>,
    session_id: String,
    await_playback: bool,
    timeout: Duration,
}

impl NatsSpeechSink {
    pub fn new(
        nats_client: Arc<NatsClient>,
        session_id: String,
        await_playback: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            nats_client,
            session_id,
            await_playback,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl SpeechSink for NatsSpeechSink {
    async fn speak(&self, text: &str) -> Result<()> {
        debug!("Speaking {} chars for {}", text.len(), self.session_id);

        tokio::time::timeout(
            self.timeout,
            self.nats_client
                .speak(&self.session_id, text, self.await_playback),
        )
        .await
        .context("TTS playback timed out")?
    }

    fn name(&self) -> &str {
        "NATS TTS"
    }
}
