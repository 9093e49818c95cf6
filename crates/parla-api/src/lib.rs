//! Parla API crate - axum HTTP server, route handlers, conversation registry.
//!
//! Exposes the general and healthcare pipelines over multipart and JSON
//! endpoints under `/api/v1`, plus knowledge-base, conversation, status and
//! configuration endpoints.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::{AppState, ConversationRegistry};
