pub mod config;
pub mod contract;
pub mod model_json;
pub mod negotiation;

pub use config::PipelineConfig;
pub use contract::{
    Alternative, Clause, ClauseType, ContractKind, ContractRecord, ContractStatus, Likelihood,
    ParsedContract, RiskLevel, RiskReport, UserContext,
};
pub use model_json::ModelJson;
pub use negotiation::{
    DraftStatus, NegotiationRequest, NegotiationRound, NegotiationSession, OutboundDraft,
    PlannedRequest, RequestStatus, RoundPlan, SessionStatus, Strategy, UserPriorities,
};
