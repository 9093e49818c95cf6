//! OpenAI-compatible speech backends (OpenAI, OpenRouter, local gateways).
//!
//! Transcription posts multipart audio to `{base_url}/audio/transcriptions`;
//! synthesis posts JSON to `{base_url}/audio/speech` and returns the raw
//! response bytes.

use async_trait::async_trait;
use parla_core::config::{require_api_key, SynthesisConfig, TranscriptionConfig};
use parla_core::{AudioInput, ParlaError, Result, SynthesizedAudio, Transcript};

use crate::http::build_client;
use crate::language::{detect_language, normalize_language};
use crate::{Synthesizer, Transcriber};

fn audio_mime(format: &str) -> &'static str {
    match format {
        "wav" => "audio/wav",
        "mp3" | "mpeg" | "mpga" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Build a transcript from a `verbose_json` (or plain `json`) response body.
///
/// The provider's language is used when it maps to an ISO code, otherwise
/// the language is detected from the text.
pub fn parse_transcription(body: &serde_json::Value, model: &str) -> Transcript {
    let text = body
        .get("text")
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    let language = body
        .get("language")
        .and_then(|l| l.as_str())
        .and_then(normalize_language)
        .unwrap_or_else(|| detect_language(&text));
    Transcript {
        text,
        language,
        confidence: None,
        model: model.to_string(),
    }
}

// =============================================================================
// Transcriber
// =============================================================================

/// Speech-to-text through an OpenAI-compatible transcription endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiTranscriber {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiTranscriber {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: build_client(timeout_secs)?,
        })
    }

    /// Build from configuration, reading the key from `api_key_env`.
    pub fn from_config(config: &TranscriptionConfig) -> Result<Self> {
        let api_key = require_api_key(&config.api_key_env)?;
        Self::new(
            config.base_url.clone(),
            api_key,
            config.model.clone(),
            config.timeout_secs,
        )
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: &AudioInput) -> Result<Transcript> {
        let format = audio.format();
        let data = match audio {
            AudioInput::File(path) => tokio::fs::read(path).await?,
            AudioInput::Bytes { data, .. } => data.clone(),
        };
        if data.is_empty() {
            return Err(ParlaError::Transcription(
                "Cannot transcribe empty audio data".to_string(),
            ));
        }

        tracing::debug!(bytes = data.len(), format = %format, model = %self.model, "Sending audio for transcription");

        let url = format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'));
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(format!("audio.{}", format))
            .mime_str(audio_mime(&format))
            .map_err(|e| ParlaError::Transcription(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ParlaError::Transcription(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ParlaError::Provider { status, body });
        }
        let body: serde_json::Value = res
            .json()
            .await
            .map_err(|e| ParlaError::Transcription(e.to_string()))?;
        Ok(parse_transcription(&body, &self.model))
    }

    fn name(&self) -> String {
        format!("openai:{}", self.model)
    }
}

// =============================================================================
// Synthesizer
// =============================================================================

/// Text-to-speech through an OpenAI-compatible speech endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiSynthesizer {
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    format: String,
    client: reqwest::Client,
}

impl OpenAiSynthesizer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            voice: "alloy".to_string(),
            format: "wav".to_string(),
            client: build_client(timeout_secs)?,
        })
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Build from configuration, reading the key from `api_key_env`.
    pub fn from_config(config: &SynthesisConfig) -> Result<Self> {
        let api_key = require_api_key(&config.api_key_env)?;
        Ok(Self::new(
            config.base_url.clone(),
            api_key,
            config.model.clone(),
            config.timeout_secs,
        )?
        .with_voice(config.voice.clone())
        .with_format(config.format.clone()))
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": self.voice,
            "response_format": self.format,
        })
    }
}

#[async_trait]
impl Synthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParlaError::Synthesis(
                "Cannot synthesize empty text".to_string(),
            ));
        }

        let url = format!("{}/audio/speech", self.base_url.trim_end_matches('/'));
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| ParlaError::Synthesis(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ParlaError::Provider { status, body });
        }
        let bytes = res
            .bytes()
            .await
            .map_err(|e| ParlaError::Synthesis(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ParlaError::Synthesis(
                "Provider returned no audio".to_string(),
            ));
        }

        tracing::debug!(bytes = bytes.len(), voice = %self.voice, "Speech synthesized");

        Ok(SynthesizedAudio {
            data: bytes.to_vec(),
            format: self.format.clone(),
        })
    }

    fn name(&self) -> String {
        format!("openai:{}", self.model)
    }
}
