use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParlaError, Result};

/// Top-level configuration for the Parla voice pipeline.
///
/// Loaded from `~/.parla/config.toml` by default. Each section corresponds
/// to one pipeline stage or cross-cutting concern. Secrets are never stored
/// here; providers name the environment variable that holds their API key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParlaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl ParlaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParlaConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.conversation.window == 0 {
            return Err(ParlaError::Config(
                "conversation.window must be at least 1".to_string(),
            ));
        }
        if self.general.port == 0 {
            return Err(ParlaError::Config("general.port must be non-zero".to_string()));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ParlaError::Config(format!(
                "generation.temperature must be within 0.0..=2.0, got {}",
                self.generation.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.generation.top_p) {
            return Err(ParlaError::Config(format!(
                "generation.top_p must be within 0.0..=1.0, got {}",
                self.generation.top_p
            )));
        }
        if self.generation.max_tokens == 0 {
            return Err(ParlaError::Config(
                "generation.max_tokens must be at least 1".to_string(),
            ));
        }
        if self.pipeline.default_target_language.trim().is_empty() {
            return Err(ParlaError::Config(
                "pipeline.default_target_language must not be empty".to_string(),
            ));
        }
        if !self
            .pipeline
            .supported_languages
            .contains(&self.pipeline.default_target_language)
        {
            return Err(ParlaError::Config(format!(
                "pipeline.default_target_language '{}' is not in pipeline.supported_languages",
                self.pipeline.default_target_language
            )));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Interface the HTTP server binds to.
    pub host: String,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Directory synthesized responses are written to.
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            output_dir: PathBuf::from("outputs"),
        }
    }
}

/// Conversation history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Number of recent turns handed to the generator.
    pub window: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self { window: 10 }
    }
}

/// Knowledge retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Augment general-flow prompts with retrieved context.
    pub enabled: bool,
    /// Documents folded into a general-flow prompt.
    pub augment_top_k: usize,
    /// Documents consulted for a healthcare statement.
    pub healthcare_top_k: usize,
    /// Optional JSON array of knowledge documents replacing the built-in seed set.
    pub knowledge_file: Option<PathBuf>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            augment_top_k: 3,
            healthcare_top_k: 2,
            knowledge_file: None,
        }
    }
}

/// Backend selection for a provider-backed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    /// Offline backend with deterministic output.
    Mock,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Mock => "mock",
        };
        f.write_str(name)
    }
}

/// Read the API key from the named environment variable.
///
/// Empty values are treated as missing.
pub fn api_key_from_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Like [`api_key_from_env`], but a missing key is a config error naming `var`.
pub fn require_api_key(var: &str) -> Result<String> {
    api_key_from_env(var)
        .ok_or_else(|| ParlaError::Config(format!("missing API key: set {}", var)))
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "whisper-1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Language generation settings.
///
/// `base_url`, `model` and `api_key_env` fall back to provider-specific
/// defaults when left unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: ProviderKind,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            base_url: None,
            model: None,
            api_key_env: None,
            max_tokens: 200,
            temperature: 0.7,
            top_p: 0.9,
            timeout_secs: 60,
        }
    }
}

impl GenerationConfig {
    pub fn resolved_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            match self.provider {
                ProviderKind::Anthropic => "https://api.anthropic.com/v1",
                _ => "https://api.openai.com/v1",
            }
            .to_string()
        })
    }

    pub fn resolved_model(&self) -> String {
        self.model.clone().unwrap_or_else(|| {
            match self.provider {
                ProviderKind::OpenAi => "gpt-4o-mini",
                ProviderKind::Anthropic => "claude-3-5-haiku-latest",
                ProviderKind::Mock => "mock",
            }
            .to_string()
        })
    }

    pub fn resolved_api_key_env(&self) -> String {
        self.api_key_env.clone().unwrap_or_else(|| {
            match self.provider {
                ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
                _ => "OPENAI_API_KEY",
            }
            .to_string()
        })
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub voice: String,
    /// Output container: "wav", "mp3", "opus", "aac", "flac".
    pub format: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            format: "wav".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Pipeline defaults applied when a request leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub default_target_language: String,
    pub synthesize_by_default: bool,
    /// ISO 639-1 codes advertised by the languages endpoint.
    pub supported_languages: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_target_language: "en".to_string(),
            synthesize_by_default: false,
            supported_languages: [
                "en", "es", "fr", "de", "it", "pt", "nl", "ru", "zh", "ja", "ko", "hi", "ar",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}
