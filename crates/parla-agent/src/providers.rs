//! HTTP generation backends.
//!
//! - [`OpenAiGenerator`]: OpenAI-compatible `/chat/completions`.
//! - [`AnthropicGenerator`]: Anthropic `/messages`.

use async_trait::async_trait;
use parla_core::config::{require_api_key, GenerationConfig};
use parla_core::{Generation, ParlaError, Result, Role, Turn};
use parla_speech::http::build_client;
use serde::{Deserialize, Serialize};

use crate::generator::{disclaimer_for, system_prompt, GenerationRequest, Generator};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Sampling settings shared by both backends.
#[derive(Debug, Clone, Copy)]
struct Sampling {
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

impl Sampling {
    fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

fn history_messages(history: &[Turn]) -> impl Iterator<Item = ChatMessage> + '_ {
    history.iter().map(|t| ChatMessage {
        role: t.role.as_str().to_string(),
        content: t.text.clone(),
    })
}

fn non_empty_reply(text: String) -> Result<String> {
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ParlaError::Generation(
            "Provider returned an empty reply".to_string(),
        ));
    }
    Ok(text)
}

async fn send_json<B, R>(request: reqwest::RequestBuilder, body: &B) -> Result<R>
where
    B: Serialize + ?Sized,
    R: for<'de> Deserialize<'de>,
{
    let res = request
        .json(body)
        .send()
        .await
        .map_err(|e| ParlaError::Generation(e.to_string()))?;
    if !res.status().is_success() {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        return Err(ParlaError::Provider { status, body });
    }
    res.json::<R>()
        .await
        .map_err(|e| ParlaError::Generation(e.to_string()))
}

// =============================================================================
// OpenAI
// =============================================================================

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions backend for OpenAI and compatible gateways.
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    base_url: String,
    api_key: String,
    model: String,
    sampling: Sampling,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let api_key = require_api_key(&config.resolved_api_key_env())?;
        Ok(Self {
            base_url: config.resolved_base_url(),
            api_key,
            model: config.resolved_model(),
            sampling: Sampling::from_config(config),
            client: build_client(config.timeout_secs)?,
        })
    }

    fn build_request(&self, request: &GenerationRequest<'_>) -> ChatCompletionRequest {
        let mut messages = vec![ChatMessage {
            role: "system".to_string(),
            content: system_prompt(
                request.mode,
                request.source_language,
                request.target_language,
            ),
        }];
        messages.extend(history_messages(request.history));
        messages.push(ChatMessage {
            role: Role::User.as_str().to_string(),
            content: request.prompt.to_string(),
        });
        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.sampling.temperature,
            max_tokens: self.sampling.max_tokens,
            top_p: self.sampling.top_p,
        }
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation> {
        let body = self.build_request(&request);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        tracing::debug!(model = %self.model, messages = body.messages.len(), "Requesting chat completion");

        let response: ChatCompletionResponse = send_json(
            self.client.post(&url).bearer_auth(&self.api_key),
            &body,
        )
        .await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(Generation {
            text: non_empty_reply(text)?,
            disclaimer: disclaimer_for(request.mode),
            model: self.model.clone(),
        })
    }

    fn name(&self) -> String {
        format!("openai:{}", self.model)
    }
}

// =============================================================================
// Anthropic
// =============================================================================

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    system: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Messages-API backend for Anthropic models.
#[derive(Debug, Clone)]
pub struct AnthropicGenerator {
    base_url: String,
    api_key: String,
    model: String,
    sampling: Sampling,
    client: reqwest::Client,
}

impl AnthropicGenerator {
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let api_key = require_api_key(&config.resolved_api_key_env())?;
        Ok(Self {
            base_url: config.resolved_base_url(),
            api_key,
            model: config.resolved_model(),
            sampling: Sampling::from_config(config),
            client: build_client(config.timeout_secs)?,
        })
    }

    fn build_request(&self, request: &GenerationRequest<'_>) -> MessagesRequest {
        // The messages API requires the first message to come from the user.
        let history = request
            .history
            .iter()
            .position(|t| t.role == Role::User)
            .map(|start| &request.history[start..])
            .unwrap_or(&[]);
        let mut messages: Vec<ChatMessage> = history_messages(history).collect();
        messages.push(ChatMessage {
            role: Role::User.as_str().to_string(),
            content: request.prompt.to_string(),
        });
        MessagesRequest {
            model: self.model.clone(),
            system: system_prompt(
                request.mode,
                request.source_language,
                request.target_language,
            ),
            messages,
            max_tokens: self.sampling.max_tokens,
            temperature: self.sampling.temperature,
        }
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation> {
        let body = self.build_request(&request);
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));
        tracing::debug!(model = %self.model, messages = body.messages.len(), "Requesting message");

        let response: MessagesResponse = send_json(
            self.client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            &body,
        )
        .await?;
        let text = response
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(Generation {
            text: non_empty_reply(text)?,
            disclaimer: disclaimer_for(request.mode),
            model: self.model.clone(),
        })
    }

    fn name(&self) -> String {
        format!("anthropic:{}", self.model)
    }
}
