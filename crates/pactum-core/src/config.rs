//! Pipeline tuning knobs, passed explicitly; there is no ambient global
//! configuration.

use std::time::Duration;

/// Configuration for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on concurrent clause-level model calls. Clause analyses
    /// are independent, but the generation service rate-limits.
    pub clause_concurrency: usize,
    /// Per-call deadline for generation-service requests.
    pub generation_timeout: Duration,
    /// Fraction of a round's requests that must be accepted for the session
    /// to advance to the next round ("substantial progress").
    pub advance_threshold: f64,
    /// Bounded negotiation length.
    pub max_rounds: u32,
    /// Overall risk score at or above which an analysed contract is marked
    /// NEEDS_NEGOTIATION rather than REVIEWED.
    pub negotiation_score_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clause_concurrency: 4,
            generation_timeout: Duration::from_secs(30),
            advance_threshold: 0.5,
            max_rounds: 3,
            negotiation_score_threshold: 7.0,
        }
    }
}
