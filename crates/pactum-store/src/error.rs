use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("contract not found: {0}")]
    ContractNotFound(String),

    #[error("negotiation session not found: {0}")]
    SessionNotFound(String),

    #[error("access denied: user {user_id} does not own {resource}")]
    AccessDenied { user_id: String, resource: String },

    /// A round-level precondition failed: the caller's view of the session
    /// is stale, or a prior round is still awaiting its response.
    #[error("round conflict on session {session_id}: {reason}")]
    RoundConflict { session_id: String, reason: String },

    #[error("validation failed: {0}")]
    Validation(String),
}
