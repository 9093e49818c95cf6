//! Parla agent crate - conversation context and pipeline orchestration.
//!
//! [`PipelineOrchestrator`] sequences the four stages (transcribe, retrieve,
//! generate, synthesize) for one session and folds every stage outcome into
//! a [`PipelineResult`] or [`HealthcareResult`].

pub mod context;
pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod providers;
pub mod services;
pub mod types;

pub use context::ConversationContext;
pub use error::{FailureKind, PipelineError, StageFailure};
pub use generator::{generator_from_config, GenerationRequest, Generator, MockGenerator};
pub use orchestrator::PipelineOrchestrator;
pub use providers::{AnthropicGenerator, OpenAiGenerator};
pub use services::{PipelineOptions, PipelineServices};
pub use types::{
    HealthcareResult, PipelineInput, PipelineResult, ProcessRequest, DEFAULT_DISCLAIMER,
};
