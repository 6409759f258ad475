// Speech source backed by an STT service on NATS
//
// start() asks the STT service to listen for this session and forwards its
// transcripts as fragments. stop() tells it to stop and ends the forwarding
// task, which emits the single CaptureEnded for the capture.

use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::source::{SpeechEvent, SpeechSource, TranscriptFragment, EVENT_BUFFER};
use crate::error::CaptureError;
use crate::nats::{CaptureAction, NatsClient, TranscriptMessage};

pub struct NatsSpeechSource {
    nats_client: Arc<NatsClient>,
    session_id: String,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl NatsSpeechSource {
    pub fn new(nats_client: Arc<NatsClient>, session_id: String) -> Self {
        Self {
            nats_client,
            session_id,
            stop_tx: None,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl SpeechSource for NatsSpeechSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<SpeechEvent>, CaptureError> {
        if self.is_capturing() {
            return Err(CaptureError::AlreadyCapturing);
        }

        info!("Starting NATS speech capture for {}", self.session_id);

        let mut subscriber = self
            .nats_client
            .subscribe_transcripts()
            .await
            .map_err(|e| CaptureError::Transport(e.to_string()))?;

        self.nats_client
            .publish_capture_control(&self.session_id, CaptureAction::Start)
            .await
            .map_err(|e| CaptureError::Transport(e.to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let session_id = self.session_id.clone();

        let task = tokio::spawn(async move {
            if tx.send(SpeechEvent::CaptureStarted).await.is_err() {
                return;
            }

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    msg = subscriber.next() => {
                        let Some(msg) = msg else {
                            debug!("Transcript subscription closed");
                            break;
                        };

                        let transcript = match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                            Ok(transcript) => transcript,
                            Err(e) => {
                                warn!("Failed to parse transcript message: {}", e);
                                continue;
                            }
                        };

                        // Filter by session_id
                        if transcript.session_id != session_id {
                            continue;
                        }

                        let fragment = TranscriptFragment {
                            text: transcript.text,
                            is_final: !transcript.partial,
                            sequence_index: transcript.segment,
                        };

                        if tx.send(SpeechEvent::Fragment(fragment)).await.is_err() {
                            break;
                        }
                    }
                }
            }

            let _ = tx.send(SpeechEvent::CaptureEnded).await;
            info!("NATS speech capture ended for {}", session_id);
        });

        self.stop_tx = Some(stop_tx);
        self.task = Some(task);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        let Some(stop_tx) = self.stop_tx.take() else {
            return Ok(());
        };

        info!("Stopping NATS speech capture for {}", self.session_id);

        // The task may already have ended on its own
        let _ = stop_tx.send(());
        self.task = None;

        self.nats_client
            .publish_capture_control(&self.session_id, CaptureAction::Stop)
            .await
            .map_err(|e| CaptureError::Transport(e.to_string()))
    }

    fn is_capturing(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn name(&self) -> &str {
        "NATS STT"
    }
}
