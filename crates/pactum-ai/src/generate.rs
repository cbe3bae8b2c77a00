//! Text-generation collaborator interface.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// The service throttled the request. Callers retry the failing unit
    /// (one clause, one draft) with backoff, never the whole batch.
    #[error("generation service rate limited{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("generation request timed out")]
    Timeout,

    #[error("generation failed: {0}")]
    Failed(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation service returned {status}: {body}")]
    Server { status: u16, body: String },
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(" (retry after {secs}s)"),
        None => String::new(),
    }
}

impl GenerateError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout)
    }
}

/// A blocking-from-the-pipeline's-perspective text-generation service.
///
/// Implementations must be safe to call concurrently; the pipeline bounds
/// its own fan-out and applies a per-call timeout on top.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, GenerateError>;
}
