use pactum_ai::GenerateError;
use pactum_extract::ExtractError;
use pactum_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Document extraction failed or timed out. Fatal for the contract,
    /// which is left in ERROR status.
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// A generation call that has no local fallback failed (strategy
    /// planning, response classification, message drafting). Retryable
    /// variants carry through so callers can retry the failing unit.
    #[error("generation error: {0}")]
    Generate(#[from] GenerateError),

    #[error("contract {0} has no extracted text")]
    MissingText(String),

    #[error("contract {0} has not been analysed")]
    NotAnalyzed(String),

    #[error("no document extractor configured")]
    ExtractorUnavailable,

    #[error("invalid session state: {0}")]
    InvalidState(String),
}
