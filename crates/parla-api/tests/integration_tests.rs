//! Integration tests for the Parla HTTP API.
//!
//! Every test builds its own router over offline mock backends and drives
//! it with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use parla_agent::PipelineServices;
use parla_api::create_router;
use parla_api::handlers::{ConversationResponse, HealthResponse, KnowledgeAddResponse};
use parla_api::state::AppState;
use parla_core::ParlaConfig;
use parla_speech::MockTranscriber;

// =============================================================================
// Helpers
// =============================================================================

const BOUNDARY: &str = "parla-test-boundary";

/// State over mock backends writing audio into `dir`.
fn make_state_with(services: PipelineServices, dir: &std::path::Path) -> AppState {
    let mut config = ParlaConfig::default();
    config.general.output_dir = dir.to_path_buf();
    AppState::new(config, services)
}

fn make_app(dir: &std::path::Path) -> axum::Router {
    create_router(make_state_with(PipelineServices::mock(), dir))
}

/// Mock backends whose transcriber always hears `text`.
fn hearing(text: &str) -> PipelineServices {
    let mut services = PipelineServices::mock();
    services.transcriber = Arc::new(MockTranscriber::with_text(text));
    services
}

/// Build a multipart POST with an optional audio file and text fields.
fn multipart_post(uri: &str, file: Option<&[u8]>, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    if let Some(data) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"clip.wav\"\r\nContent-Type: audio/wav\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::post(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

/// Read full response body bytes.
async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 10 * 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

const AUDIO: &[u8] = b"RIFF-fake-audio-bytes";

// =============================================================================
// Health and metadata
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path()).oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "0.1.0");
}

#[tokio::test]
async fn test_languages_lists_supported_codes() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(get("/api/v1/languages"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let codes: Vec<&str> = json["languages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(codes.contains(&"hi"));
    assert!(codes.contains(&"es"));
    assert_eq!(json["default_target"], "en");
}

#[tokio::test]
async fn test_config_exposes_env_var_names_only() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(get("/api/v1/config"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["general"]["port"], 8000);
    assert_eq!(json["conversation"]["window"], 10);
    assert_eq!(json["transcription"]["api_key_env"], "OPENAI_API_KEY");
}

#[tokio::test]
async fn test_status_reports_backends() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(get("/api/v1/status"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "ready");
    assert_eq!(json["components"].as_array().unwrap().len(), 4);
    assert_eq!(json["knowledge_documents"], 5);
    assert_eq!(json["conversation"], "default");
    assert_eq!(json["conversation_length"], 0);
}

// =============================================================================
// Transcribe
// =============================================================================

#[tokio::test]
async fn test_transcribe_happy_path() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(multipart_post("/api/v1/transcribe", Some(AUDIO), &[]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["text"], "[mock transcription]");
    assert_eq!(json["language"], "en");
    assert_eq!(json["model"], "mock");
}

#[tokio::test]
async fn test_transcribe_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(multipart_post("/api/v1/transcribe", None, &[("target_language", "en")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_transcribe_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(multipart_post("/api/v1/transcribe", Some(b""), &[]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Process
// =============================================================================

#[tokio::test]
async fn test_process_happy_path_records_history() {
    let dir = tempfile::tempdir().unwrap();
    let app = make_app(dir.path());

    let resp = app
        .clone()
        .oneshot(multipart_post(
            "/api/v1/process",
            Some(AUDIO),
            &[("target_language", "es")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["transcribed_text"], "[mock transcription]");
    assert_eq!(json["target_language"], "es");
    assert!(json["ai_response"]
        .as_str()
        .unwrap()
        .starts_with("[mock response in es]"));
    assert!(json.get("error").is_none());
    assert!(json.get("output_audio").is_none());

    let resp = app.oneshot(get("/api/v1/conversation")).await.unwrap();
    let conv: ConversationResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(conv.conversation, "default");
    assert_eq!(conv.total_messages, 2);
    assert_eq!(conv.history[0].text, "[mock transcription]");
}

#[tokio::test]
async fn test_process_with_tts_writes_audio() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(multipart_post(
            "/api/v1/process",
            Some(AUDIO),
            &[("with_tts", "true")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let path = json["output_audio"].as_str().unwrap();
    let session_id = json["session_id"].as_str().unwrap();
    assert!(path.ends_with(&format!("response_{}.wav", session_id)));
    let bytes = std::fs::read(path).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
}

#[tokio::test]
async fn test_process_unsupported_language() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(multipart_post(
            "/api/v1/process",
            Some(AUDIO),
            &[("target_language", "xx")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_process_invalid_flag() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(multipart_post(
            "/api/v1/process",
            Some(AUDIO),
            &[("with_tts", "sometimes")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_process_empty_transcript_is_422() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(make_state_with(hearing(""), dir.path()));
    let resp = app
        .clone()
        .oneshot(multipart_post("/api/v1/process", Some(AUDIO), &[]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp).await;
    assert_eq!(json["error"]["kind"], "transcription_failed");
    assert!(json.get("ai_response").is_none());

    let resp = app.oneshot(get("/api/v1/conversation")).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["total_messages"], 0);
}

#[tokio::test]
async fn test_conversations_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let app = make_app(dir.path());

    let resp = app
        .clone()
        .oneshot(multipart_post(
            "/api/v1/process?conversation=alice",
            Some(AUDIO),
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(get("/api/v1/conversation?conversation=alice"))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["total_messages"], 2);

    let resp = app
        .oneshot(get("/api/v1/conversation?conversation=bob"))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["conversation"], "bob");
    assert_eq!(json["total_messages"], 0);
}

#[tokio::test]
async fn test_clear_conversation() {
    let dir = tempfile::tempdir().unwrap();
    let app = make_app(dir.path());

    app.clone()
        .oneshot(multipart_post("/api/v1/process", Some(AUDIO), &[]))
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(delete("/api/v1/conversation"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["cleared"], true);

    let resp = app.oneshot(get("/api/v1/conversation")).await.unwrap();
    assert_eq!(body_json(resp).await["total_messages"], 0);
}

#[tokio::test]
async fn test_clear_conversation_releases_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state_with(PipelineServices::mock(), dir.path());
    let app = create_router(state.clone());

    for i in 0..20 {
        let uri = format!("/api/v1/translate?conversation=c{}", i);
        let resp = app
            .clone()
            .oneshot(post_json(&uri, r#"{"text": "Hello there", "with_tts": false}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert_eq!(state.conversations.len().unwrap(), 20);

    for i in 0..20 {
        let uri = format!("/api/v1/conversation?conversation=c{}", i);
        let resp = app.clone().oneshot(delete(&uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert!(state.conversations.is_empty().unwrap());

    // Clearing an unknown conversation stays a no-op.
    let resp = app
        .clone()
        .oneshot(delete("/api/v1/conversation?conversation=ghost"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(state.conversations.is_empty().unwrap());
}

// =============================================================================
// Translate
// =============================================================================

#[tokio::test]
async fn test_translate_detects_source_language() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(post_json(
            "/api/v1/translate",
            r#"{"text": "¿Dónde está el hospital?", "target_language": "en"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["source_language"], "es");
    assert_eq!(json["transcribed_text"], "¿Dónde está el hospital?");
    assert!(json["ai_response"].as_str().is_some());
}

#[tokio::test]
async fn test_translate_empty_text() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(post_json("/api/v1/translate", r#"{"text": "  "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Healthcare
// =============================================================================

#[tokio::test]
async fn test_healthcare_emergency() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(make_state_with(hearing("I have Chest Pain"), dir.path()));
    let resp = app
        .oneshot(multipart_post("/api/v1/healthcare", Some(AUDIO), &[]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["is_emergency"], true);
    assert_eq!(
        json["emergency_alert"],
        "CONTACT EMERGENCY SERVICES IMMEDIATELY"
    );
    assert!(json["medical_context"]["summary"]
        .as_str()
        .unwrap()
        .starts_with("EMERGENCY"));
    assert!(json["disclaimer"].as_str().unwrap().contains("emergency services"));
}

#[tokio::test]
async fn test_healthcare_non_emergency() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(make_state_with(hearing("sore throat"), dir.path()));
    let resp = app
        .oneshot(multipart_post("/api/v1/healthcare", Some(AUDIO), &[]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["is_emergency"], false);
    assert!(json.get("emergency_alert").is_none());
    assert_eq!(json["medical_context"]["recommendations"].as_array().unwrap().len(), 3);
}

// =============================================================================
// Text-to-speech
// =============================================================================

#[tokio::test]
async fn test_text_to_speech_returns_audio() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(post_json("/api/v1/text-to-speech", r#"{"text": "hello there"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "audio/wav");
    let bytes = body_bytes(resp).await;
    assert_eq!(&bytes[0..4], b"RIFF");
}

#[tokio::test]
async fn test_text_to_speech_empty_text() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(post_json("/api/v1/text-to-speech", r#"{"text": ""}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Knowledge
// =============================================================================

#[tokio::test]
async fn test_knowledge_search() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(get("/api/v1/knowledge?query=fever&top_k=2"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["results"][0]["id"], 1);
    assert_eq!(json["results"][0]["domain"], "healthcare");
}

#[tokio::test]
async fn test_knowledge_search_requires_query() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(get("/api/v1/knowledge"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_knowledge_add_then_search() {
    let dir = tempfile::tempdir().unwrap();
    let app = make_app(dir.path());

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/v1/knowledge",
            r#"{"domain": "travel", "content": "Vaccinations for yellow fever zones"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let added: KnowledgeAddResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(added.document_id, 6);
    assert_eq!(added.domain, "travel");

    let resp = app
        .oneshot(get("/api/v1/knowledge?query=yellow"))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["results"][0]["id"], 6);
}

#[tokio::test]
async fn test_knowledge_add_rejects_blank_content() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(post_json(
            "/api/v1/knowledge",
            r#"{"domain": "travel", "content": " "}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let resp = make_app(dir.path())
        .oneshot(get("/api/v1/nope"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
