//! Keyword relevance scoring.
//!
//! A document's score is the number of query words (lower-cased,
//! whitespace-split) that occur as a substring of its hint and content.
//! Repeated query words count once per occurrence in the query.

use parla_core::{KnowledgeDocument, RetrievedDocument};

/// Score one document against pre-split, lower-cased query words.
pub fn score(words: &[String], doc: &KnowledgeDocument) -> usize {
    let haystack = format!("{} {}", doc.query_hint, doc.content).to_lowercase();
    words.iter().filter(|w| haystack.contains(w.as_str())).count()
}

/// Lower-case and whitespace-split a query.
pub fn query_words(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

/// Rank `docs` for `query`, returning at most `top_k` matches.
///
/// Zero-score documents are dropped. Ties keep insertion order.
pub fn rank(docs: &[KnowledgeDocument], query: &str, top_k: usize) -> Vec<RetrievedDocument> {
    if top_k == 0 || docs.is_empty() {
        return Vec::new();
    }
    let words = query_words(query);
    if words.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<(usize, &KnowledgeDocument)> = docs
        .iter()
        .map(|doc| (score(&words, doc), doc))
        .filter(|(s, _)| *s > 0)
        .collect();
    // sort_by is stable
    hits.sort_by(|a, b| b.0.cmp(&a.0));
    hits.truncate(top_k);

    hits.into_iter()
        .map(|(s, doc)| RetrievedDocument {
            id: doc.id,
            domain: doc.domain.clone(),
            content: doc.content.clone(),
            relevance_score: s as f64,
        })
        .collect()
}
