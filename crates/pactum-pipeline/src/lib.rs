//! The analysis-and-negotiation pipeline.
//!
//! Raw contract text flows through the segmenter into typed clauses, the
//! risk scorer turns those into a risk report, the recommendation engine
//! attaches alternative language to risky clauses, the strategist plans a
//! bounded negotiation, and the session state machine consumes counterparty
//! responses round by round. [`Pipeline`] wires the stages to their
//! external collaborators.

mod draft;
mod error;
mod orchestrator;
pub mod prompts;
mod recommend;
mod risk;
pub mod segment;
mod session;
mod strategy;

pub use draft::draft_message;
pub use error::PipelineError;
pub use orchestrator::Pipeline;
pub use recommend::recommend;
pub use risk::score_clauses;
pub use session::{NextAction, ResponseOutcome, process_response};
pub use strategy::plan;
