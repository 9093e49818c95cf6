//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression,
//! and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use parla_core::{ParlaConfig, ParlaError};

use crate::handlers;
use crate::state::AppState;

/// Largest accepted audio upload.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Limit for JSON-only endpoints.
const MAX_JSON_BYTES: usize = 256 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Browser clients on the configured port and the one above it (dev server).
    let port = state.config.general.port;
    let origins: Vec<HeaderValue> = [port, port.saturating_add(1)]
        .iter()
        .flat_map(|p| {
            [
                format!("http://127.0.0.1:{}", p),
                format!("http://localhost:{}", p),
            ]
        })
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let upload_routes = Router::new()
        .route("/transcribe", post(handlers::transcribe))
        .route("/process", post(handlers::process))
        .route("/healthcare", post(handlers::healthcare))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let json_routes = Router::new()
        .route("/translate", post(handlers::translate))
        .route("/text-to-speech", post(handlers::text_to_speech))
        .route(
            "/conversation",
            get(handlers::get_conversation).delete(handlers::clear_conversation),
        )
        .route(
            "/knowledge",
            get(handlers::search_knowledge).post(handlers::add_knowledge),
        )
        .route("/status", get(handlers::status))
        .route("/languages", get(handlers::languages))
        .route("/config", get(handlers::get_config))
        .layer(DefaultBodyLimit::max(MAX_JSON_BYTES));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", upload_routes.merge(json_routes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured host and port.
pub async fn start_server(config: &ParlaConfig, state: AppState) -> Result<(), ParlaError> {
    let addr = format!("{}:{}", config.general.host, config.general.port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParlaError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| ParlaError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
