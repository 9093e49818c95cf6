//! Response generation stage.
//!
//! A [`Generator`] turns a prompt, a language pair, and the recent
//! conversation window into a reply. HTTP backends live in
//! [`crate::providers`]; [`MockGenerator`] runs offline.

use std::sync::Arc;

use async_trait::async_trait;
use parla_core::config::{GenerationConfig, ProviderKind};
use parla_core::{Generation, GenerationMode, ParlaError, Result, Turn};

use crate::providers::{AnthropicGenerator, OpenAiGenerator};
use crate::types::DEFAULT_DISCLAIMER;

/// Everything a generator needs for one reply.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Possibly augmented user text.
    pub prompt: &'a str,
    pub source_language: &'a str,
    pub target_language: &'a str,
    /// Recent turns, oldest first. Does not include `prompt`.
    pub history: &'a [Turn],
    pub mode: GenerationMode,
}

/// Produces assistant replies.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation>;

    /// Backend label for status reporting, e.g. "openai:gpt-4o-mini".
    fn name(&self) -> String;
}

/// System prompt for a generation mode.
pub fn system_prompt(mode: GenerationMode, source_language: &str, target_language: &str) -> String {
    match mode {
        GenerationMode::Conversation => format!(
            "You are a helpful multilingual AI assistant.\n\
             The user is speaking in {} and wants responses in {}.\n\
             Maintain context from previous messages and provide accurate, helpful responses.\n\
             Keep responses concise and natural.",
            source_language, target_language
        ),
        GenerationMode::Healthcare => "You are a helpful medical information assistant.\n\
             Provide accurate, empathetic health information.\n\
             IMPORTANT: Always remind users to consult with a licensed healthcare provider\n\
             for medical diagnosis and treatment decisions.\n\
             Be clear this is informational only, not medical advice."
            .to_string(),
    }
}

/// Disclaimer a backend attaches for `mode`.
pub fn disclaimer_for(mode: GenerationMode) -> Option<String> {
    match mode {
        GenerationMode::Healthcare => Some(DEFAULT_DISCLAIMER.to_string()),
        GenerationMode::Conversation => None,
    }
}

/// Build the generator selected by configuration.
pub fn generator_from_config(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    match config.provider {
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiGenerator::from_config(config)?)),
        ProviderKind::Anthropic => Ok(Arc::new(AnthropicGenerator::from_config(config)?)),
        ProviderKind::Mock => Ok(Arc::new(MockGenerator::new())),
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Deterministic offline generator.
///
/// Replies with a fixed text when configured, otherwise with a short echo
/// tagged with the target language.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    reply: Option<String>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
        }
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation> {
        if request.prompt.trim().is_empty() {
            return Err(ParlaError::Generation("Prompt is empty".to_string()));
        }
        let text = match &self.reply {
            Some(reply) => reply.clone(),
            None => {
                let excerpt: String = request.prompt.chars().take(80).collect();
                format!(
                    "[mock response in {}] {}",
                    request.target_language, excerpt
                )
            }
        };
        Ok(Generation {
            text,
            disclaimer: disclaimer_for(request.mode),
            model: "mock".to_string(),
        })
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}
