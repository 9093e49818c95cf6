//! Pipeline orchestrator: sequences transcription, retrieval, generation and
//! synthesis for one conversation session.
//!
//! Stages run strictly in order. Collaborator errors never escape; they are
//! folded into the returned result as fatal `error` or as non-fatal
//! `retrieval_error` / `tts_error` diagnostics.

use std::path::PathBuf;

use parla_core::{AudioInput, Generation, GenerationMode, ParlaError, Role, Turn};
use parla_retrieval::{augment_prompt, EMERGENCY_ALERT};
use parla_speech::detect_language;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::context::ConversationContext;
use crate::error::PipelineError;
use crate::generator::GenerationRequest;
use crate::services::{PipelineOptions, PipelineServices};
use crate::types::{
    HealthcareResult, PipelineInput, PipelineResult, ProcessRequest, DEFAULT_DISCLAIMER,
};

/// Text and language produced by the first stage.
struct Heard {
    text: String,
    language: String,
}

/// Drives one session's conversation through the pipeline stages.
///
/// Owns its [`ConversationContext`]; runs take `&mut self` so a session has
/// a single driver at a time.
pub struct PipelineOrchestrator {
    services: PipelineServices,
    context: ConversationContext,
    options: PipelineOptions,
}

impl PipelineOrchestrator {
    pub fn new(services: PipelineServices, options: PipelineOptions) -> Self {
        let context = ConversationContext::new(options.window);
        Self {
            services,
            context,
            options,
        }
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Full retained history.
    pub fn history(&self) -> Vec<Turn> {
        self.context.snapshot()
    }

    pub fn clear(&mut self) {
        self.context.clear();
        info!("Conversation history cleared");
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    // =========================================================================
    // General flow
    // =========================================================================

    /// Run the general flow for one input.
    pub async fn process(&mut self, request: ProcessRequest) -> PipelineResult {
        let mut result = PipelineResult::new(request.target_language.clone());
        let session_id = result.session_id;

        let heard = match self.hear(request.input, session_id).await {
            Ok(heard) => heard,
            Err(e) => {
                result.error = Some(e.into());
                return result;
            }
        };
        result.transcribed_text = Some(heard.text.clone());
        result.source_language = Some(heard.language.clone());

        let prompt = if self.options.retrieval_enabled {
            match self
                .services
                .retriever
                .retrieve(&heard.text, self.options.augment_top_k)
                .await
            {
                Ok(docs) => {
                    info!(session_id = %session_id, stage = "retrieval", documents = docs.len(), "Context retrieved");
                    augment_prompt(&docs, &heard.text)
                }
                Err(e) => {
                    warn!(session_id = %session_id, stage = "retrieval", error = %e, "Retrieval degraded; using raw transcript");
                    result.retrieval_error = Some(PipelineError::retrieval(&e).into());
                    heard.text.clone()
                }
            }
        } else {
            heard.text.clone()
        };

        let generation = match self
            .generate(
                &prompt,
                &heard,
                &request.target_language,
                GenerationMode::Conversation,
                session_id,
            )
            .await
        {
            Ok(generation) => generation,
            Err(e) => {
                result.error = Some(e.into());
                return result;
            }
        };
        result.ai_response = Some(generation.text.clone());
        result.model = Some(generation.model.clone());

        if request.synthesize {
            match self.synthesize(&generation.text, session_id).await {
                Ok(path) => result.output_audio = Some(path),
                Err(e) => {
                    warn!(session_id = %session_id, stage = "synthesis", error = %e, "Synthesis failed; returning text only");
                    result.tts_error = Some(e.into());
                }
            }
        }

        info!(session_id = %session_id, turns = self.context.len(), "Pipeline run complete");
        result
    }

    // =========================================================================
    // Healthcare flow
    // =========================================================================

    /// Run the emergency-aware healthcare flow for one input.
    ///
    /// The result always carries a disclaimer, and an emergency alert is
    /// surfaced even when generation fails.
    pub async fn healthcare(&mut self, input: PipelineInput) -> HealthcareResult {
        let mut result = HealthcareResult::new("en");
        let session_id = result.base.session_id;

        let heard = match self.hear(input, session_id).await {
            Ok(heard) => heard,
            Err(e) => {
                result.base.error = Some(e.into());
                return result;
            }
        };
        result.base.transcribed_text = Some(heard.text.clone());
        result.base.source_language = Some(heard.language.clone());
        result.base.target_language = heard.language.clone();

        match self
            .services
            .retriever
            .healthcare_context(&heard.text, self.options.healthcare_top_k)
            .await
        {
            Ok(ctx) => {
                result.is_emergency = ctx.emergency;
                result.medical_context = Some(ctx);
            }
            Err(e) => {
                warn!(session_id = %session_id, stage = "retrieval", error = %e, "Healthcare retrieval degraded");
                result.base.retrieval_error = Some(PipelineError::retrieval(&e).into());
            }
        }

        if result.is_emergency {
            warn!(session_id = %session_id, "Emergency detected in patient statement");
            result.emergency_alert = Some(EMERGENCY_ALERT.to_string());
        }

        let target = heard.language.clone();
        match self
            .generate(
                &heard.text,
                &heard,
                &target,
                GenerationMode::Healthcare,
                session_id,
            )
            .await
        {
            Ok(generation) => {
                result.base.ai_response = Some(generation.text);
                result.base.model = Some(generation.model);
                result.disclaimer = generation
                    .disclaimer
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_DISCLAIMER.to_string());
            }
            Err(e) => result.base.error = Some(e.into()),
        }

        result
    }

    // =========================================================================
    // Stages
    // =========================================================================

    /// Transcribe audio, or accept text directly.
    async fn hear(&self, input: PipelineInput, session_id: Uuid) -> Result<Heard, PipelineError> {
        match input {
            PipelineInput::Text {
                text,
                source_language,
            } => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    error!(session_id = %session_id, stage = "transcription", "Empty input text");
                    return Err(PipelineError::TranscriptionFailed {
                        reason: "input text is empty".to_string(),
                        details: None,
                    });
                }
                let language = source_language
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or_else(|| detect_language(&text));
                Ok(Heard { text, language })
            }
            PipelineInput::Audio(audio) => self.transcribe(&audio, session_id).await,
        }
    }

    async fn transcribe(&self, audio: &AudioInput, session_id: Uuid) -> Result<Heard, PipelineError> {
        info!(session_id = %session_id, stage = "transcription", audio = %audio.describe(), "Transcribing");
        let transcript = self
            .services
            .transcriber
            .transcribe(audio)
            .await
            .map_err(|e| {
                error!(session_id = %session_id, stage = "transcription", error = %e, "Transcription failed");
                PipelineError::transcription(&e)
            })?;

        let text = transcript.text.trim().to_string();
        if text.is_empty() {
            error!(session_id = %session_id, stage = "transcription", "Transcription returned no text");
            return Err(PipelineError::TranscriptionFailed {
                reason: "no speech recognized".to_string(),
                details: Some(json!({
                    "language": transcript.language,
                    "model": transcript.model,
                })),
            });
        }
        info!(session_id = %session_id, stage = "transcription", language = %transcript.language, chars = text.len(), "Transcribed");
        Ok(Heard {
            text,
            language: transcript.language,
        })
    }

    /// Call the generator and record the exchange on success.
    async fn generate(
        &mut self,
        prompt: &str,
        heard: &Heard,
        target_language: &str,
        mode: GenerationMode,
        session_id: Uuid,
    ) -> Result<Generation, PipelineError> {
        let request = GenerationRequest {
            prompt,
            source_language: &heard.language,
            target_language,
            history: self.context.window(),
            mode,
        };
        let outcome = self.services.generator.generate(request).await;

        let generation = match outcome {
            Ok(g) if !g.text.trim().is_empty() => g,
            Ok(_) => {
                error!(session_id = %session_id, stage = "generation", "Generator returned an empty reply");
                return Err(PipelineError::generation(&ParlaError::Generation(
                    "empty reply".to_string(),
                )));
            }
            Err(e) => {
                error!(session_id = %session_id, stage = "generation", error = %e, "Generation failed");
                return Err(PipelineError::generation(&e));
            }
        };

        self.context.append(Role::User, heard.text.clone());
        self.context.append(Role::Assistant, generation.text.clone());
        info!(session_id = %session_id, stage = "generation", model = %generation.model, chars = generation.text.len(), "Reply generated");
        Ok(generation)
    }

    /// Synthesize `text` and write it as `response_<session_id>.<ext>`.
    async fn synthesize(&self, text: &str, session_id: Uuid) -> Result<PathBuf, PipelineError> {
        let audio = self
            .services
            .synthesizer
            .synthesize(text)
            .await
            .map_err(|e| PipelineError::synthesis(&e))?;

        let dir = &self.options.output_dir;
        let path = dir.join(format!("response_{}.{}", session_id, audio.format));
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, &audio.data).await
        }
        .await;
        written.map_err(|e| PipelineError::synthesis(&ParlaError::Io(e)))?;

        info!(session_id = %session_id, stage = "synthesis", bytes = audio.data.len(), path = %path.display(), "Reply synthesized");
        Ok(path)
    }
}
