//! In-memory knowledge base with keyword retrieval.

use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use parla_core::config::RetrievalConfig;
use parla_core::{KnowledgeDocument, ParlaError, Result, RetrievedDocument};
use tracing::info;

use crate::scoring::rank;
use crate::{NewDocument, Retriever};

/// Characters of content used as the hint when none is given.
const HINT_PREFIX_CHARS: usize = 50;

/// Built-in healthcare knowledge used when no knowledge file is configured.
pub fn seed_documents() -> Vec<KnowledgeDocument> {
    let seed = [
        (
            "healthcare",
            "fever symptoms",
            "High temperature, body aches, fatigue. Drink water, rest, consult doctor if >103°F",
        ),
        (
            "healthcare",
            "sore throat",
            "Throat pain, difficulty swallowing. Gargle salt water, drink warm tea, rest voice",
        ),
        (
            "healthcare",
            "headache relief",
            "Pain in head/temples. Rest in quiet dark room, drink water, apply cold compress",
        ),
        (
            "emergency",
            "chest pain",
            "EMERGENCY: Call ambulance immediately. Chest pain can indicate heart problem.",
        ),
        (
            "nutrition",
            "healthy diet",
            "Balanced diet: fruits, vegetables, whole grains, lean proteins, healthy fats",
        ),
    ];
    seed.iter()
        .enumerate()
        .map(|(i, (domain, hint, content))| KnowledgeDocument {
            id: i as u64 + 1,
            domain: domain.to_string(),
            query_hint: hint.to_string(),
            content: content.to_string(),
        })
        .collect()
}

/// Keyword-scored retriever over an in-memory document list.
///
/// Thread-safe via interior RwLock; documents are only ever appended.
#[derive(Debug)]
pub struct KeywordRetriever {
    documents: RwLock<Vec<KnowledgeDocument>>,
}

impl Default for KeywordRetriever {
    fn default() -> Self {
        Self::from_documents(seed_documents())
    }
}

impl KeywordRetriever {
    /// Create a retriever with no documents.
    pub fn empty() -> Self {
        Self::from_documents(Vec::new())
    }

    pub fn from_documents(documents: Vec<KnowledgeDocument>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Load documents from a JSON array file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let documents: Vec<KnowledgeDocument> = serde_json::from_str(&content)?;
        info!(
            count = documents.len(),
            "Knowledge base loaded from {}",
            path.display()
        );
        Ok(Self::from_documents(documents))
    }

    /// Knowledge file when configured, built-in seed set otherwise.
    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        match &config.knowledge_file {
            Some(path) => Self::load_json(path),
            None => Ok(Self::default()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<KnowledgeDocument>>> {
        self.documents
            .read()
            .map_err(|e| ParlaError::Retrieval(format!("Lock poisoned: {}", e)))
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDocument>> {
        let documents = self.read()?;
        let hits = rank(&documents, query, top_k);
        tracing::debug!(
            query_len = query.len(),
            hits = hits.len(),
            "Keyword retrieval complete"
        );
        Ok(hits)
    }

    async fn add(&self, document: NewDocument) -> Result<KnowledgeDocument> {
        let content = document.content.trim().to_string();
        if content.is_empty() {
            return Err(ParlaError::Retrieval(
                "Document content must not be empty".to_string(),
            ));
        }
        let query_hint = document
            .query_hint
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| content.chars().take(HINT_PREFIX_CHARS).collect());

        let mut documents = self
            .documents
            .write()
            .map_err(|e| ParlaError::Retrieval(format!("Lock poisoned: {}", e)))?;
        // Contiguous ids give len + 1; never reuse an id from a loaded file.
        let id = documents
            .iter()
            .map(|d| d.id)
            .max()
            .unwrap_or(0)
            .max(documents.len() as u64)
            + 1;
        let doc = KnowledgeDocument {
            id,
            domain: document.domain,
            query_hint,
            content,
        };
        documents.push(doc.clone());
        info!(id, domain = %doc.domain, "Document added to knowledge base");
        Ok(doc)
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
