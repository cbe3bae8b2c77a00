//! Knowledge-retrieval collaborator interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One retrieved reference clause with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exemplar {
    pub text: String,
    pub score: f32,
    pub source: String,
}

#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The corpus is not reachable or not configured. Callers fall back to
    /// the static clause library.
    #[error("knowledge retrieval unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// A knowledge corpus queried for reference clause language.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    /// Return up to `top_k` exemplars for the query, best first.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Exemplar>, RetrieveError>;
}
