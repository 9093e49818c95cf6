use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation
// =============================================================================

/// Who authored a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name used by chat-completion style providers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a conversation. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

// =============================================================================
// Audio
// =============================================================================

/// Audio handed to the transcription stage.
///
/// Bytes are passed through to the provider untouched; `format` is the file
/// extension the provider should assume (e.g. "wav", "mp3", "m4a").
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioInput {
    /// Audio stored on disk.
    File(PathBuf),
    /// Raw audio bytes, typically from an upload or a live stream.
    Bytes { data: Vec<u8>, format: String },
}

impl AudioInput {
    /// Build a byte input, deriving the format from an uploaded file name.
    ///
    /// Falls back to "wav" when the name has no usable extension.
    pub fn from_upload(data: Vec<u8>, file_name: Option<&str>) -> Self {
        let format = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.trim().to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "wav".to_string());
        AudioInput::Bytes { data, format }
    }

    /// Audio container format (file extension, lower-case).
    pub fn format(&self) -> String {
        match self {
            AudioInput::File(path) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .unwrap_or_else(|| "wav".to_string()),
            AudioInput::Bytes { format, .. } => format.clone(),
        }
    }

    /// Short human-readable description for logs.
    pub fn describe(&self) -> String {
        match self {
            AudioInput::File(path) => format!("file {}", path.display()),
            AudioInput::Bytes { data, format } => format!("{} bytes of {}", data.len(), format),
        }
    }
}

/// Output of a transcription call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Transcribed text. Empty means nothing usable was recognized.
    pub text: String,
    /// ISO 639-1 code, or "unknown".
    pub language: String,
    /// Provider confidence when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Model that produced the transcript.
    pub model: String,
}

/// Audio produced by a synthesis call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub data: Vec<u8>,
    /// File extension for the container ("wav", "mp3", ...).
    pub format: String,
}

impl SynthesizedAudio {
    /// MIME type matching `format`.
    pub fn mime_type(&self) -> &'static str {
        match self.format.as_str() {
            "wav" => "audio/wav",
            "mp3" => "audio/mpeg",
            "opus" => "audio/opus",
            "aac" => "audio/aac",
            "flac" => "audio/flac",
            _ => "application/octet-stream",
        }
    }
}

// =============================================================================
// Retrieval
// =============================================================================

/// A document stored in the knowledge base.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: u64,
    pub domain: String,
    /// Short phrase describing what the document answers; scored alongside content.
    #[serde(alias = "query")]
    pub query_hint: String,
    pub content: String,
}

/// A document returned for a query, produced fresh per lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: u64,
    pub domain: String,
    pub content: String,
    pub relevance_score: f64,
}

/// Healthcare-specific retrieval output for a patient statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MedicalContext {
    pub symptom: String,
    /// Best matching knowledge snippet, or a generic referral.
    pub summary: String,
    pub recommendations: Vec<String>,
    pub emergency: bool,
}

// =============================================================================
// Generation
// =============================================================================

/// Prompting mode for the response generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Multilingual assistant replying in the target language.
    #[default]
    Conversation,
    /// Medical information assistant; replies carry a disclaimer.
    Healthcare,
}

/// Output of a generation call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_turn_new_sets_timestamp() {
        let before = Utc::now();
        let turn = Turn::new(Role::User, "hello");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.text, "hello");
        assert!(turn.timestamp >= before);
    }

    #[test]
    fn test_audio_input_from_upload_uses_extension() {
        let input = AudioInput::from_upload(vec![1, 2, 3], Some("Clip.MP3"));
        assert_eq!(input.format(), "mp3");
        assert_eq!(input.describe(), "3 bytes of mp3");
    }

    #[test]
    fn test_audio_input_from_upload_defaults_to_wav() {
        assert_eq!(AudioInput::from_upload(vec![], None).format(), "wav");
        assert_eq!(AudioInput::from_upload(vec![], Some("noext")).format(), "wav");
        assert_eq!(AudioInput::from_upload(vec![], Some("bad.")).format(), "wav");
    }

    #[test]
    fn test_audio_input_file_format() {
        let input = AudioInput::File(PathBuf::from("/tmp/patient.M4A"));
        assert_eq!(input.format(), "m4a");
        assert!(input.describe().contains("patient.M4A"));
    }

    #[test]
    fn test_synthesized_audio_mime_type() {
        let audio = SynthesizedAudio {
            data: vec![],
            format: "mp3".to_string(),
        };
        assert_eq!(audio.mime_type(), "audio/mpeg");

        let audio = SynthesizedAudio {
            data: vec![],
            format: "xyz".to_string(),
        };
        assert_eq!(audio.mime_type(), "application/octet-stream");
    }

    #[test]
    fn test_knowledge_document_accepts_query_alias() {
        let json = r#"{"id": 7, "domain": "healthcare", "query": "fever symptoms", "content": "Rest."}"#;
        let doc: KnowledgeDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.query_hint, "fever symptoms");
    }

    #[test]
    fn test_generation_skips_missing_disclaimer() {
        let gen = Generation {
            text: "hi".to_string(),
            disclaimer: None,
            model: "mock".to_string(),
        };
        let json = serde_json::to_value(&gen).unwrap();
        assert!(json.get("disclaimer").is_none());
    }
}
