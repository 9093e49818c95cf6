//! Offline backends with deterministic output.
//!
//! Used for development and tests without network access or API keys.

use async_trait::async_trait;
use parla_core::{AudioInput, ParlaError, Result, SynthesizedAudio, Transcript};

use crate::language::detect_language;
use crate::wav;
use crate::{Synthesizer, Transcriber};

const MOCK_TRANSCRIPT: &str = "[mock transcription]";
const MOCK_SAMPLE_RATE: u32 = 16_000;
const MS_PER_WORD: u32 = 300;
const MAX_MOCK_MS: u32 = 10_000;

// =============================================================================
// Transcriber
// =============================================================================

/// Returns a fixed transcript for any non-empty audio.
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    text: String,
    language: Option<String>,
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self {
            text: MOCK_TRANSCRIPT.to_string(),
            language: None,
        }
    }

    /// Return `text` for every call. The language is detected from it unless set.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &AudioInput) -> Result<Transcript> {
        let size = match audio {
            AudioInput::File(path) => tokio::fs::metadata(path).await?.len() as usize,
            AudioInput::Bytes { data, .. } => data.len(),
        };
        if size == 0 {
            return Err(ParlaError::Transcription(
                "Cannot transcribe empty audio data".to_string(),
            ));
        }

        tracing::debug!(bytes = size, "Mock transcription generated");

        let language = self
            .language
            .clone()
            .unwrap_or_else(|| detect_language(&self.text));
        Ok(Transcript {
            text: self.text.clone(),
            language,
            confidence: Some(0.95),
            model: "mock".to_string(),
        })
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}

// =============================================================================
// Synthesizer
// =============================================================================

/// Emits silent PCM16 WAV audio whose length tracks the word count.
#[derive(Debug, Clone, Default)]
pub struct MockSynthesizer;

impl MockSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        let words = text.split_whitespace().count() as u32;
        if words == 0 {
            return Err(ParlaError::Synthesis(
                "Cannot synthesize empty text".to_string(),
            ));
        }
        let duration_ms = (words * MS_PER_WORD).min(MAX_MOCK_MS);
        Ok(SynthesizedAudio {
            data: wav::silence(duration_ms, MOCK_SAMPLE_RATE),
            format: "wav".to_string(),
        })
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn bytes(data: &[u8]) -> AudioInput {
        AudioInput::Bytes {
            data: data.to_vec(),
            format: "wav".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_transcription_basic() {
        let transcriber = MockTranscriber::new();
        let transcript = transcriber.transcribe(&bytes(&[1, 2, 3])).await.unwrap();
        assert_eq!(transcript.text, "[mock transcription]");
        assert_eq!(transcript.language, "en");
        assert_eq!(transcript.model, "mock");
    }

    #[tokio::test]
    async fn test_mock_transcription_empty_audio() {
        let transcriber = MockTranscriber::new();
        let err = transcriber.transcribe(&bytes(&[])).await.unwrap_err();
        assert!(matches!(err, ParlaError::Transcription(_)));
    }

    #[tokio::test]
    async fn test_mock_transcription_detects_language_of_text() {
        let transcriber = MockTranscriber::with_text("Tengo dolor de cabeza, señor");
        let transcript = transcriber.transcribe(&bytes(&[0; 8])).await.unwrap();
        assert_eq!(transcript.language, "es");
    }

    #[tokio::test]
    async fn test_mock_transcription_explicit_language() {
        let transcriber = MockTranscriber::with_text("ciao").with_language("it");
        let transcript = transcriber.transcribe(&bytes(&[0; 8])).await.unwrap();
        assert_eq!(transcript.language, "it");
    }

    #[tokio::test]
    async fn test_mock_transcription_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"RIFF....").unwrap();
        let transcriber = MockTranscriber::new();
        let transcript = transcriber
            .transcribe(&AudioInput::File(file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(transcript.text, "[mock transcription]");
    }

    #[tokio::test]
    async fn test_mock_transcription_missing_file() {
        let transcriber = MockTranscriber::new();
        let err = transcriber
            .transcribe(&AudioInput::File("/nonexistent/clip.wav".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ParlaError::Io(_)));
    }

    #[tokio::test]
    async fn test_mock_synthesis_produces_wav() {
        let audio = MockSynthesizer::new().synthesize("hello there").await.unwrap();
        assert_eq!(audio.format, "wav");
        assert_eq!(&audio.data[0..4], b"RIFF");
        // 2 words * 300 ms at 16 kHz, 2 bytes per sample
        assert_eq!(audio.data.len(), wav::HEADER_LEN + 9_600 * 2);
    }

    #[tokio::test]
    async fn test_mock_synthesis_empty_text() {
        let err = MockSynthesizer::new().synthesize("   ").await.unwrap_err();
        assert!(matches!(err, ParlaError::Synthesis(_)));
    }
}
