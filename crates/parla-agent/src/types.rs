use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parla_core::{AudioInput, MedicalContext};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StageFailure;

/// Disclaimer attached to healthcare replies when the generator supplies none.
pub const DEFAULT_DISCLAIMER: &str =
    "For medical emergencies, contact emergency services immediately.";

// =============================================================================
// Requests
// =============================================================================

/// What the pipeline starts from.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineInput {
    /// Audio to be transcribed.
    Audio(AudioInput),
    /// Already transcribed text; transcription is skipped.
    Text {
        text: String,
        /// Detected from the text when absent.
        source_language: Option<String>,
    },
}

/// One general-flow invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRequest {
    pub input: PipelineInput,
    pub target_language: String,
    pub synthesize: bool,
}

impl ProcessRequest {
    pub fn audio(audio: AudioInput, target_language: impl Into<String>) -> Self {
        Self {
            input: PipelineInput::Audio(audio),
            target_language: target_language.into(),
            synthesize: false,
        }
    }

    pub fn text(
        text: impl Into<String>,
        source_language: Option<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            input: PipelineInput::Text {
                text: text.into(),
                source_language,
            },
            target_language: target_language.into(),
            synthesize: false,
        }
    }

    pub fn with_synthesis(mut self, synthesize: bool) -> Self {
        self.synthesize = synthesize;
        self
    }
}

// =============================================================================
// Results
// =============================================================================

/// Unified outcome of a general-flow run.
///
/// Exactly one of `ai_response` and `error` is set once transcription has
/// succeeded; an early transcription failure sets only `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub session_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcribed_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
    pub target_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Where synthesized audio was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StageFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_error: Option<StageFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_error: Option<StageFailure>,
    pub created_at: DateTime<Utc>,
}

impl PipelineResult {
    /// Empty result with a fresh session id.
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            transcribed_text: None,
            source_language: None,
            target_language: target_language.into(),
            ai_response: None,
            model: None,
            output_audio: None,
            error: None,
            retrieval_error: None,
            tts_error: None,
            created_at: Utc::now(),
        }
    }

    /// A reply was produced and no fatal stage failed.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.ai_response.is_some()
    }
}

/// Outcome of a healthcare-flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthcareResult {
    #[serde(flatten)]
    pub base: PipelineResult,
    pub medical_context: Option<MedicalContext>,
    pub is_emergency: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_alert: Option<String>,
    pub disclaimer: String,
}

impl HealthcareResult {
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            base: PipelineResult::new(target_language),
            medical_context: None,
            is_emergency: false,
            emergency_alert: None,
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.base.is_success()
    }
}
