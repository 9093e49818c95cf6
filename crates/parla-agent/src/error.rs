//! Stage failure taxonomy for the pipeline.
//!
//! Fatal failures (transcription, generation) end a run early; degraded
//! stages (retrieval, synthesis) are attached to the result as diagnostics.
//! Nothing in this module is ever returned as `Err` past the orchestrator.

use parla_core::ParlaError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A stage failure as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("transcription failed: {reason}")]
    TranscriptionFailed {
        reason: String,
        details: Option<Value>,
    },
    #[error("generation failed: {reason}")]
    GenerationFailed {
        reason: String,
        details: Option<Value>,
    },
    #[error("retrieval degraded: {reason}")]
    RetrievalDegraded {
        reason: String,
        details: Option<Value>,
    },
    #[error("synthesis failed: {reason}")]
    SynthesisFailed {
        reason: String,
        details: Option<Value>,
    },
}

/// Diagnostic payload for a collaborator error.
fn details_of(err: &ParlaError) -> Option<Value> {
    match err {
        ParlaError::Provider { status, body } => Some(json!({ "status": status, "body": body })),
        ParlaError::Io(io) => Some(json!({ "io_kind": format!("{:?}", io.kind()) })),
        _ => None,
    }
}

impl PipelineError {
    pub fn transcription(err: &ParlaError) -> Self {
        PipelineError::TranscriptionFailed {
            reason: err.to_string(),
            details: details_of(err),
        }
    }

    pub fn generation(err: &ParlaError) -> Self {
        PipelineError::GenerationFailed {
            reason: err.to_string(),
            details: details_of(err),
        }
    }

    pub fn retrieval(err: &ParlaError) -> Self {
        PipelineError::RetrievalDegraded {
            reason: err.to_string(),
            details: details_of(err),
        }
    }

    pub fn synthesis(err: &ParlaError) -> Self {
        PipelineError::SynthesisFailed {
            reason: err.to_string(),
            details: details_of(err),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::TranscriptionFailed { .. } => FailureKind::TranscriptionFailed,
            PipelineError::GenerationFailed { .. } => FailureKind::GenerationFailed,
            PipelineError::RetrievalDegraded { .. } => FailureKind::RetrievalDegraded,
            PipelineError::SynthesisFailed { .. } => FailureKind::SynthesisFailed,
        }
    }

    /// Whether the failure ends the run.
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

/// Serializable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    TranscriptionFailed,
    GenerationFailed,
    RetrievalDegraded,
    SynthesisFailed,
}

impl FailureKind {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FailureKind::TranscriptionFailed | FailureKind::GenerationFailed
        )
    }
}

/// Failure record carried in a pipeline result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<PipelineError> for StageFailure {
    fn from(err: PipelineError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        let details = match err {
            PipelineError::TranscriptionFailed { details, .. }
            | PipelineError::GenerationFailed { details, .. }
            | PipelineError::RetrievalDegraded { details, .. }
            | PipelineError::SynthesisFailed { details, .. } => details,
        };
        StageFailure {
            kind,
            message,
            details,
        }
    }
}
