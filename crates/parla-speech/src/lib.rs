//! Parla speech crate - transcription and synthesis stages.
//!
//! Provides trait-based abstractions for speech-to-text and text-to-speech,
//! OpenAI-compatible HTTP backends, offline mock backends for development
//! and tests, and a script-based language detector for transcripts whose
//! provider reports no language.

use std::sync::Arc;

use async_trait::async_trait;
use parla_core::config::{ProviderKind, SynthesisConfig, TranscriptionConfig};
use parla_core::{AudioInput, ParlaError, Result, SynthesizedAudio, Transcript};

pub mod http;
pub mod language;
pub mod mock;
pub mod openai;
pub mod wav;

pub use language::{detect_language, normalize_language};
pub use mock::{MockSynthesizer, MockTranscriber};
pub use openai::{OpenAiSynthesizer, OpenAiTranscriber};

// =============================================================================
// Traits
// =============================================================================

/// Converts audio into text.
///
/// An empty transcript means nothing usable was recognized; the
/// orchestrator treats it as a failed transcription.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio input.
    async fn transcribe(&self, audio: &AudioInput) -> Result<Transcript>;

    /// Backend label for status reporting, e.g. "openai:whisper-1".
    fn name(&self) -> String;
}

/// Converts text into audio.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize speech for `text`.
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio>;

    /// Backend label for status reporting, e.g. "openai:tts-1".
    fn name(&self) -> String;
}

// =============================================================================
// Factories
// =============================================================================

/// Build the transcriber selected by configuration.
pub fn transcriber_from_config(config: &TranscriptionConfig) -> Result<Arc<dyn Transcriber>> {
    match config.provider {
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiTranscriber::from_config(config)?)),
        ProviderKind::Mock => Ok(Arc::new(MockTranscriber::new())),
        other => Err(ParlaError::Config(format!(
            "transcription provider '{}' is not supported",
            other
        ))),
    }
}

/// Build the synthesizer selected by configuration.
pub fn synthesizer_from_config(config: &SynthesisConfig) -> Result<Arc<dyn Synthesizer>> {
    match config.provider {
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiSynthesizer::from_config(config)?)),
        ProviderKind::Mock => Ok(Arc::new(MockSynthesizer::new())),
        other => Err(ParlaError::Config(format!(
            "synthesis provider '{}' is not supported",
            other
        ))),
    }
}
