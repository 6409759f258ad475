use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::error::ConfigurationError;
use crate::questions::{QuestionDefinition, QuestionGraph};
use crate::session::{SessionConfig, ValidatorKind};
use crate::speech::{NarrationMode, SpeechSourceKind};
use crate::validation::ValidatorMessages;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
    pub questions: Vec<QuestionDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub url: String,
    pub validation_subject: String,
    pub request_timeout_ms: u64,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            validation_subject: "interview.validate".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    pub silence_delay_ms: u64,
    pub speech_source: SpeechSourceKind,
    pub validator: ValidatorKind,
    pub narration: NarrationMode,
    pub await_playback: bool,
    pub messages: ValidatorMessages,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            silence_delay_ms: 1000,
            speech_source: SpeechSourceKind::Disabled,
            validator: ValidatorKind::Rules,
            narration: NarrationMode::Silent,
            await_playback: false,
            messages: ValidatorMessages::default(),
        }
    }
}

impl Config {
    /// Load from a config file, with `VOICE_INTERVIEW__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("VOICE_INTERVIEW").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Build and validate the question graph
    pub fn question_graph(&self) -> Result<QuestionGraph, ConfigurationError> {
        QuestionGraph::new(self.questions.clone())
    }

    /// Session settings for a new interview
    pub fn session_config(&self, session_id: Option<String>) -> SessionConfig {
        let defaults = SessionConfig::default();

        SessionConfig {
            session_id: session_id.unwrap_or(defaults.session_id),
            silence_delay: Duration::from_millis(self.interview.silence_delay_ms),
            speech_source: self.interview.speech_source,
            validator: self.interview.validator,
            narration: self.interview.narration,
            await_playback: self.interview.await_playback,
            messages: self.interview.messages.clone(),
            nats_url: self.nats.url.clone(),
            validation_subject: self.nats.validation_subject.clone(),
            request_timeout: Duration::from_millis(self.nats.request_timeout_ms),
        }
    }
}
