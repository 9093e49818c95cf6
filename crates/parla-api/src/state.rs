//! Application state shared across all route handlers.
//!
//! AppState holds the stage backends, the effective configuration and the
//! registry of named conversations. It is passed to handlers via axum's
//! State extractor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use parla_agent::{PipelineOptions, PipelineOrchestrator, PipelineServices};
use parla_core::{ParlaConfig, ParlaError, Result};

/// Name used when a request does not pick a conversation.
pub const DEFAULT_CONVERSATION: &str = "default";

/// A conversation's orchestrator behind its own async lock.
pub type SharedSession = Arc<tokio::sync::Mutex<PipelineOrchestrator>>;

/// One orchestrator per conversation name.
///
/// The map lock is held only to look up or insert; each session has its
/// own async mutex so a long pipeline run never blocks other sessions.
pub struct ConversationRegistry {
    sessions: Mutex<HashMap<String, SharedSession>>,
    services: PipelineServices,
    options: PipelineOptions,
}

impl ConversationRegistry {
    pub fn new(services: PipelineServices, options: PipelineOptions) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            services,
            options,
        }
    }

    /// Existing session, or a fresh one with empty history.
    pub fn get_or_create(&self, name: &str) -> Result<SharedSession> {
        let mut sessions = self.lock()?;
        let session = sessions.entry(name.to_string()).or_insert_with(|| {
            tracing::info!(conversation = %name, "Conversation started");
            Arc::new(tokio::sync::Mutex::new(PipelineOrchestrator::new(
                self.services.clone(),
                self.options.clone(),
            )))
        });
        Ok(Arc::clone(session))
    }

    pub fn get(&self, name: &str) -> Result<Option<SharedSession>> {
        Ok(self.lock()?.get(name).cloned())
    }

    /// Drop a conversation, returning its session if it existed.
    pub fn remove(&self, name: &str) -> Result<Option<SharedSession>> {
        let removed = self.lock()?.remove(name);
        if removed.is_some() {
            tracing::info!(conversation = %name, "Conversation removed");
        }
        Ok(removed)
    }

    /// Number of live conversations.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, SharedSession>>> {
        self.sessions
            .lock()
            .map_err(|e| ParlaError::Api(format!("Conversation registry lock poisoned: {}", e)))
    }
}

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Effective configuration. Read-only once the server is up.
    pub config: Arc<ParlaConfig>,
    /// Stage backends, shared with every conversation.
    pub services: PipelineServices,
    pub conversations: Arc<ConversationRegistry>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ParlaConfig, services: PipelineServices) -> Self {
        let options = PipelineOptions::from_config(&config);
        Self {
            conversations: Arc::new(ConversationRegistry::new(services.clone(), options)),
            config: Arc::new(config),
            services,
            start_time: Instant::now(),
        }
    }
}
