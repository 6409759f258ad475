// Silence-based utterance segmentation
//
// Turns a live stream of transcript fragments into discrete utterances.
// Every fragment pushes the silence deadline out by `silence_delay`; when the
// deadline passes with text accumulated, that text is one utterance.
//
// There is at most one deadline at a time. It is plain state (no spawned
// timer), so cancelling is just clearing it and is naturally idempotent.
// The owner waits on `silence_elapsed()` and calls `expire()` when it fires.

use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use super::source::TranscriptFragment;

/// Quiet interval after which accumulated speech counts as complete
pub const DEFAULT_SILENCE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug)]
pub struct UtteranceSegmenter {
    silence_delay: Duration,
    active: bool,
    /// Final fragments since the last utterance, each followed by one space
    finalized: String,
    /// Pending interim hypotheses by result slot
    interim: BTreeMap<u64, String>,
    deadline: Option<Instant>,
}

impl Default for UtteranceSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_DELAY)
    }
}

impl UtteranceSegmenter {
    pub fn new(silence_delay: Duration) -> Self {
        Self {
            silence_delay,
            active: false,
            finalized: String::new(),
            interim: BTreeMap::new(),
            deadline: None,
        }
    }

    pub fn silence_delay(&self) -> Duration {
        self.silence_delay
    }

    /// Begin a capture with empty state
    pub fn start(&mut self) {
        self.clear();
        self.active = true;
    }

    /// Cancel the pending deadline and discard unemitted text
    pub fn stop(&mut self) {
        if self.active && !self.live_text().trim().is_empty() {
            debug!("Discarding partial utterance on stop");
        }
        self.clear();
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Accumulate a fragment and restart the silence deadline.
    ///
    /// Returns false (and ignores the fragment) when the segmenter is not started.
    pub fn push(&mut self, fragment: TranscriptFragment) -> bool {
        if !self.active {
            return false;
        }

        if fragment.is_final {
            self.interim.retain(|index, _| *index > fragment.sequence_index);
            self.finalized.push_str(&fragment.text);
            self.finalized.push(' ');
        } else {
            self.interim.insert(fragment.sequence_index, fragment.text);
        }

        self.deadline = Some(Instant::now() + self.silence_delay);
        true
    }

    /// Finalized text followed by pending interim text, for live display
    pub fn live_text(&self) -> String {
        let mut text = self.finalized.clone();
        for interim in self.interim.values() {
            text.push_str(interim);
        }
        text
    }

    /// When the current silence deadline fires, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolves when the pending deadline passes; never resolves without one
    pub async fn silence_elapsed(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    /// Handle deadline expiry: emit the accumulated text if there is any.
    ///
    /// Capture is single-shot, so the segmenter goes inactive either way and
    /// the owner should stop its speech source.
    pub fn expire(&mut self) -> Option<String> {
        let text = self.live_text();
        self.clear();
        self.active = false;

        if text.trim().is_empty() {
            None
        } else {
            debug!("Utterance complete ({} chars)", text.len());
            Some(text)
        }
    }

    fn clear(&mut self) {
        self.finalized.clear();
        self.interim.clear();
        self.deadline = None;
    }
}
