//! Parla retrieval crate - knowledge lookup for prompt augmentation.
//!
//! Retrieval is keyword scoring over an in-memory knowledge base. The
//! healthcare flow layers emergency detection and fixed guidance on top of
//! the same lookup.

use async_trait::async_trait;
use parla_core::{KnowledgeDocument, MedicalContext, Result, RetrievedDocument};
use serde::{Deserialize, Serialize};

pub mod healthcare;
pub mod knowledge;
pub mod prompt;
pub mod scoring;

pub use healthcare::{is_emergency, EMERGENCY_ALERT, EMERGENCY_PHRASES};
pub use knowledge::{seed_documents, KeywordRetriever};
pub use prompt::augment_prompt;

/// A document submitted for insertion; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub domain: String,
    pub content: String,
    #[serde(default)]
    pub query_hint: Option<String>,
}

/// Ranked context lookup over a knowledge base.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `top_k` documents relevant to `query`, best first.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDocument>>;

    /// Append a document and return it with its assigned id.
    async fn add(&self, document: NewDocument) -> Result<KnowledgeDocument>;

    async fn document_count(&self) -> Result<usize>;

    /// Healthcare view of a patient statement: best snippet, guidance and
    /// emergency flag.
    async fn healthcare_context(&self, symptom: &str, top_k: usize) -> Result<MedicalContext> {
        let docs = self.retrieve(symptom, top_k).await?;
        Ok(healthcare::medical_context(symptom, &docs))
    }
}
