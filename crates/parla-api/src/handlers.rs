//! Route handler functions for all API endpoints.
//!
//! Each handler extracts query parameters, JSON bodies or multipart uploads
//! via axum extractors, drives the conversation's orchestrator or a shared
//! backend, and returns JSON responses.

use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use parla_agent::{PipelineInput, ProcessRequest};
use parla_core::{AudioInput, ParlaConfig, RetrievedDocument, Turn};
use parla_retrieval::NewDocument;

use crate::error::ApiError;
use crate::state::{AppState, DEFAULT_CONVERSATION};

// =============================================================================
// Query parameter and request types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ConversationParams {
    pub conversation: Option<String>,
}

impl ConversationParams {
    /// Requested conversation name, or the default one.
    pub fn name(&self) -> &str {
        self.conversation
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_CONVERSATION)
    }
}

#[derive(Debug, Deserialize)]
pub struct KnowledgeParams {
    pub query: Option<String>,
    pub top_k: Option<usize>,
}

/// Request body for POST /api/v1/translate.
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    /// Detected from the text when absent.
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub with_tts: Option<bool>,
}

/// Request body for POST /api/v1/text-to-speech.
#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
    pub language: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation: String,
    pub history: Vec<Turn>,
    pub total_messages: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub conversation: String,
    pub cleared: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KnowledgeSearchResponse {
    pub query: String,
    pub results: Vec<RetrievedDocument>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KnowledgeAddResponse {
    pub document_id: u64,
    pub domain: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub stage: String,
    pub backend: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub components: Vec<ComponentStatus>,
    pub knowledge_documents: usize,
    pub conversations: usize,
    pub conversation: String,
    pub conversation_length: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguagesResponse {
    pub languages: Vec<String>,
    pub default_target: String,
}

// =============================================================================
// Upload parsing
// =============================================================================

/// Audio file plus the text fields sent alongside it.
#[derive(Debug)]
struct AudioUpload {
    audio: AudioInput,
    target_language: Option<String>,
    with_tts: Option<bool>,
}

/// Read a multipart body with a required `file` field.
async fn read_upload(mut multipart: Multipart) -> Result<AudioUpload, ApiError> {
    let mut audio = None;
    let mut target_language = None;
    let mut with_tts = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
                if data.is_empty() {
                    return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
                }
                audio = Some(AudioInput::from_upload(data.to_vec(), file_name.as_deref()));
            }
            "target_language" => {
                target_language = Some(field_text(field).await?);
            }
            "with_tts" => {
                with_tts = Some(parse_flag(&field_text(field).await?)?);
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let audio =
        audio.ok_or_else(|| ApiError::BadRequest("Missing multipart field 'file'".to_string()))?;
    Ok(AudioUpload {
        audio,
        target_language,
        with_tts,
    })
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map(|t| t.trim().to_string())
        .map_err(|e| ApiError::BadRequest(format!("Invalid form field: {}", e)))
}

fn parse_flag(value: &str) -> Result<bool, ApiError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ApiError::BadRequest(format!(
            "Invalid boolean value: '{}'",
            other
        ))),
    }
}

/// Requested target language, defaulted and checked against the supported set.
fn resolve_target(config: &ParlaConfig, requested: Option<String>) -> Result<String, ApiError> {
    let target = requested
        .map(|l| l.trim().to_ascii_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| config.pipeline.default_target_language.clone());
    if !config.pipeline.supported_languages.contains(&target) {
        return Err(ApiError::BadRequest(format!(
            "Unsupported target language: '{}'",
            target
        )));
    }
    Ok(target)
}

/// 200 for a successful run, 422 with the same body otherwise.
fn pipeline_response<T: Serialize>(success: bool, body: T) -> Response {
    let status = if success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(body)).into_response()
}

// =============================================================================
// Pipeline endpoints
// =============================================================================

/// POST /api/v1/transcribe - transcription only; no conversation state.
pub async fn transcribe(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    let transcript = state.services.transcriber.transcribe(&upload.audio).await?;
    Ok(Json(TranscribeResponse {
        text: transcript.text,
        language: transcript.language,
        model: transcript.model,
        confidence: transcript.confidence,
    }))
}

/// POST /api/v1/process - full general flow from an audio upload.
pub async fn process(
    State(state): State<AppState>,
    Query(params): Query<ConversationParams>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    let target = resolve_target(&state.config, upload.target_language)?;
    let synthesize = upload
        .with_tts
        .unwrap_or(state.config.pipeline.synthesize_by_default);

    let session = state.conversations.get_or_create(params.name())?;
    let mut orchestrator = session.lock().await;
    let result = orchestrator
        .process(ProcessRequest::audio(upload.audio, target).with_synthesis(synthesize))
        .await;
    Ok(pipeline_response(result.is_success(), result))
}

/// POST /api/v1/translate - general flow from text, skipping transcription.
pub async fn translate(
    State(state): State<AppState>,
    Query(params): Query<ConversationParams>,
    Json(req): Json<TranslateRequest>,
) -> Result<Response, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Text must not be empty".to_string()));
    }
    let target = resolve_target(&state.config, req.target_language)?;
    let synthesize = req
        .with_tts
        .unwrap_or(state.config.pipeline.synthesize_by_default);

    let session = state.conversations.get_or_create(params.name())?;
    let mut orchestrator = session.lock().await;
    let result = orchestrator
        .process(ProcessRequest::text(req.text, req.source_language, target).with_synthesis(synthesize))
        .await;
    Ok(pipeline_response(result.is_success(), result))
}

/// POST /api/v1/healthcare - emergency-aware healthcare flow.
pub async fn healthcare(
    State(state): State<AppState>,
    Query(params): Query<ConversationParams>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;

    let session = state.conversations.get_or_create(params.name())?;
    let mut orchestrator = session.lock().await;
    let result = orchestrator
        .healthcare(PipelineInput::Audio(upload.audio))
        .await;
    if result.is_emergency {
        tracing::warn!(conversation = %params.name(), session_id = %result.base.session_id, "Emergency alert returned to client");
    }
    Ok(pipeline_response(result.is_success(), result))
}

/// POST /api/v1/text-to-speech - synthesize text directly.
pub async fn text_to_speech(
    State(state): State<AppState>,
    Json(req): Json<SpeechRequest>,
) -> Result<Response, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Text must not be empty".to_string()));
    }
    let audio = state.services.synthesizer.synthesize(&req.text).await?;
    Ok(([(header::CONTENT_TYPE, audio.mime_type())], audio.data).into_response())
}

// =============================================================================
// Conversation endpoints
// =============================================================================

/// GET /api/v1/conversation - retained history of a conversation.
pub async fn get_conversation(
    State(state): State<AppState>,
    Query(params): Query<ConversationParams>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let history = match state.conversations.get(params.name())? {
        Some(session) => session.lock().await.history(),
        None => Vec::new(),
    };
    Ok(Json(ConversationResponse {
        conversation: params.name().to_string(),
        total_messages: history.len(),
        history,
    }))
}

/// DELETE /api/v1/conversation - forget a conversation's history.
pub async fn clear_conversation(
    State(state): State<AppState>,
    Query(params): Query<ConversationParams>,
) -> Result<Json<ClearResponse>, ApiError> {
    // In-flight requests may still hold the removed session.
    if let Some(session) = state.conversations.remove(params.name())? {
        session.lock().await.clear();
    }
    Ok(Json(ClearResponse {
        conversation: params.name().to_string(),
        cleared: true,
    }))
}

// =============================================================================
// Knowledge endpoints
// =============================================================================

/// GET /api/v1/knowledge - ranked keyword search.
pub async fn search_knowledge(
    State(state): State<AppState>,
    Query(params): Query<KnowledgeParams>,
) -> Result<Json<KnowledgeSearchResponse>, ApiError> {
    let query = params
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query parameter 'query' is required".to_string()))?;
    let top_k = params
        .top_k
        .unwrap_or(state.config.retrieval.augment_top_k);

    let results = state.services.retriever.retrieve(&query, top_k).await?;
    Ok(Json(KnowledgeSearchResponse {
        query,
        total: results.len(),
        results,
    }))
}

/// POST /api/v1/knowledge - add a document to the knowledge base.
pub async fn add_knowledge(
    State(state): State<AppState>,
    Json(doc): Json<NewDocument>,
) -> Result<(StatusCode, Json<KnowledgeAddResponse>), ApiError> {
    if doc.domain.trim().is_empty() {
        return Err(ApiError::BadRequest("Domain must not be empty".to_string()));
    }
    if doc.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content must not be empty".to_string()));
    }
    let stored = state.services.retriever.add(doc).await?;
    Ok((
        StatusCode::CREATED,
        Json(KnowledgeAddResponse {
            document_id: stored.id,
            domain: stored.domain,
        }),
    ))
}

// =============================================================================
// Status endpoints
// =============================================================================

/// GET /health - liveness.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /api/v1/status - backends, knowledge size and conversation length.
pub async fn status(
    State(state): State<AppState>,
    Query(params): Query<ConversationParams>,
) -> Result<Json<StatusResponse>, ApiError> {
    let components = state
        .services
        .describe()
        .into_iter()
        .map(|(stage, backend)| ComponentStatus {
            stage: stage.to_string(),
            backend,
        })
        .collect();
    let conversation_length = match state.conversations.get(params.name())? {
        Some(session) => session.lock().await.context().len(),
        None => 0,
    };

    Ok(Json(StatusResponse {
        status: "ready".to_string(),
        components,
        knowledge_documents: state.services.retriever.document_count().await?,
        conversations: state.conversations.len()?,
        conversation: params.name().to_string(),
        conversation_length,
        uptime_secs: state.start_time.elapsed().as_secs(),
    }))
}

/// GET /api/v1/languages - supported target languages.
pub async fn languages(State(state): State<AppState>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: state.config.pipeline.supported_languages.clone(),
        default_target: state.config.pipeline.default_target_language.clone(),
    })
}

/// GET /api/v1/config - effective configuration. Holds env var names, never keys.
pub async fn get_config(State(state): State<AppState>) -> Json<ParlaConfig> {
    Json(state.config.as_ref().clone())
}
