//! Negotiation-side data model: requests, rounds, sessions, strategies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::ClauseType;

/// Status of an individual change request. Transitions are one-way:
/// `Pending` → {`Accepted`, `Rejected`, `Countered`} → optionally
/// `Withdrawn`. A resolved request never returns to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Countered,
    Withdrawn,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Countered => "COUNTERED",
            Self::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A single requested change to one clause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationRequest {
    pub id: String,
    pub clause_id: String,
    pub clause_type: ClauseType,
    pub original_text: String,
    pub proposed_text: String,
    pub rationale: String,
    /// 1–10, 10 = critical.
    pub priority: u8,
    pub status: RequestStatus,
    #[serde(default)]
    pub counterparty_response: Option<String>,
    #[serde(default)]
    pub final_text: Option<String>,
}

impl NegotiationRequest {
    pub fn new(
        clause_id: impl Into<String>,
        clause_type: ClauseType,
        original_text: impl Into<String>,
        proposed_text: impl Into<String>,
        rationale: impl Into<String>,
        priority: u8,
    ) -> Self {
        Self {
            id: format!("req-{}", Uuid::new_v4()),
            clause_id: clause_id.into(),
            clause_type,
            original_text: original_text.into(),
            proposed_text: proposed_text.into(),
            rationale: rationale.into(),
            priority: priority.clamp(1, 10),
            status: RequestStatus::Pending,
            counterparty_response: None,
            final_text: None,
        }
    }

    /// Apply a resolution. Returns `false` (leaving the request untouched)
    /// when it is already resolved, which makes response re-processing
    /// idempotent.
    pub fn resolve(&mut self, status: RequestStatus) -> bool {
        if self.status.is_resolved() || !status.is_resolved() {
            return false;
        }
        self.status = status;
        if status == RequestStatus::Accepted {
            self.final_text = Some(self.proposed_text.clone());
        }
        true
    }
}

/// One request inside a planned round, before it is turned into a live
/// [`NegotiationRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedRequest {
    pub clause_type: ClauseType,
    #[serde(default)]
    pub clause_id: Option<String>,
    #[serde(default)]
    pub current_issue: String,
    pub request: String,
    #[serde(default)]
    pub rationale: String,
    /// 0–100, estimated by the language model.
    #[serde(default)]
    pub acceptance_likelihood: u8,
}

/// Plan for one negotiation round within a [`Strategy`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundPlan {
    pub objective: String,
    #[serde(default, alias = "priority_requests")]
    pub requests: Vec<PlannedRequest>,
    #[serde(default)]
    pub talking_points: Vec<String>,
    #[serde(default)]
    pub expected_outcome: String,
    /// Round 2: condition under which this round applies.
    #[serde(default)]
    pub conditional_on: Option<String>,
    /// Round 2: "if they reject X, offer Y" fallbacks.
    #[serde(default)]
    pub compromise_positions: Vec<String>,
    /// Round 3: deal-breakers that trigger abandoning the negotiation.
    #[serde(default)]
    pub walk_away_triggers: Vec<String>,
}

/// User-stated negotiation priorities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPriorities {
    #[serde(default)]
    pub must_haves: Vec<String>,
    #[serde(default)]
    pub nice_to_haves: Vec<String>,
}

/// A complete negotiation strategy: exactly three round plans plus the
/// overall framing. Immutable once attached to a session; re-planning
/// creates a new strategy on a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub overall_approach: String,
    /// Ordered priorities, most important first.
    #[serde(default)]
    pub priorities: Vec<String>,
    #[serde(default)]
    pub walk_away_conditions: Vec<String>,
    /// Clause type → fallback position, when the model provides one.
    #[serde(default)]
    pub compromise_positions: BTreeMap<String, String>,
    pub rounds: Vec<RoundPlan>,
    #[serde(default)]
    pub estimated_timeline: String,
    /// 0–100.
    #[serde(default)]
    pub success_probability: u8,
    pub created_at: DateTime<Utc>,
}

impl Strategy {
    pub fn round_plan(&self, round_number: u32) -> Option<&RoundPlan> {
        if round_number == 0 {
            return None;
        }
        self.rounds.get((round_number - 1) as usize)
    }
}

/// Review status of an outbound draft. Drafts are created pending approval
/// and nothing in the pipeline ever sends one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStatus {
    PendingApproval,
    Approved,
    Discarded,
}

/// A drafted outbound message to the counterparty, gated on human approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundDraft {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub tone: String,
    pub status: DraftStatus,
    pub created_at: DateTime<Utc>,
}

/// One cycle of proposing changes and receiving the counterparty's answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationRound {
    /// 1-based, strictly increasing within a session.
    pub round_number: u32,
    pub requests: Vec<NegotiationRequest>,
    #[serde(default)]
    pub outbound_draft: Option<OutboundDraft>,
    #[serde(default)]
    pub counterparty_response: Option<String>,
    /// Request ids classified from the counterparty response.
    #[serde(default)]
    pub accepted: Vec<String>,
    #[serde(default)]
    pub rejected: Vec<String>,
    #[serde(default)]
    pub countered: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl NegotiationRound {
    pub fn new(round_number: u32, requests: Vec<NegotiationRequest>) -> Self {
        Self {
            round_number,
            requests,
            outbound_draft: None,
            counterparty_response: None,
            accepted: Vec::new(),
            rejected: Vec::new(),
            countered: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// A round stays open until a counterparty response has been processed
    /// or it was explicitly abandoned.
    pub fn is_open(&self) -> bool {
        self.completed_at.is_none()
    }
}

/// Session lifecycle. `Pending → InProgress → AwaitingResponse`, then back
/// to `InProgress` for the next round or on to `Completed`; the terminal
/// outcomes `Accepted`, `Rejected`, and `Stalled` are reachable from
/// `AwaitingResponse` or `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Pending,
    InProgress,
    AwaitingResponse,
    Completed,
    Accepted,
    Rejected,
    Stalled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::AwaitingResponse => "AWAITING_RESPONSE",
            Self::Completed => "COMPLETED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Stalled => "STALLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Stalled)
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Completed) && !self.is_terminal()
    }
}

/// A complete negotiation for one contract: strategy, append-only rounds,
/// and aggregate counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationSession {
    pub id: String,
    pub contract_id: String,
    pub user_id: String,
    pub strategy: Strategy,
    pub rounds: Vec<NegotiationRound>,
    pub status: SessionStatus,
    pub requests_made: u32,
    pub accepted_count: u32,
    pub rejected_count: u32,
    #[serde(default)]
    pub final_recommendation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl NegotiationSession {
    pub fn new(
        contract_id: impl Into<String>,
        user_id: impl Into<String>,
        strategy: Strategy,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: format!("session-{}", Uuid::new_v4()),
            contract_id: contract_id.into(),
            user_id: user_id.into(),
            strategy,
            rounds: Vec::new(),
            status: SessionStatus::Pending,
            requests_made: 0,
            accepted_count: 0,
            rejected_count: 0,
            final_recommendation: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn current_round(&self) -> Option<&NegotiationRound> {
        self.rounds.last()
    }

    pub fn current_round_mut(&mut self) -> Option<&mut NegotiationRound> {
        self.rounds.last_mut()
    }

    /// Accepted / total, 0.0 when nothing has been requested yet.
    pub fn success_rate(&self) -> f64 {
        if self.requests_made == 0 {
            return 0.0;
        }
        self.accepted_count as f64 / self.requests_made as f64
    }

    /// Recompute aggregate counters from round contents.
    pub fn refresh_counters(&mut self) {
        self.requests_made = self.rounds.iter().map(|r| r.requests.len() as u32).sum();
        self.accepted_count = self
            .rounds
            .iter()
            .flat_map(|r| &r.requests)
            .filter(|q| q.status == RequestStatus::Accepted)
            .count() as u32;
        self.rejected_count = self
            .rounds
            .iter()
            .flat_map(|r| &r.requests)
            .filter(|q| q.status == RequestStatus::Rejected)
            .count() as u32;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NegotiationRequest {
        NegotiationRequest::new(
            "liability_1",
            ClauseType::Liability,
            "unlimited liability",
            "cap at 12 months of fees",
            "industry standard",
            9,
        )
    }

    #[test]
    fn resolve_is_one_way() {
        let mut req = request();
        assert!(req.resolve(RequestStatus::Accepted));
        assert_eq!(req.status, RequestStatus::Accepted);
        assert_eq!(req.final_text.as_deref(), Some("cap at 12 months of fees"));

        // Re-processing the same response must not move it back.
        assert!(!req.resolve(RequestStatus::Rejected));
        assert_eq!(req.status, RequestStatus::Accepted);
        assert!(!req.resolve(RequestStatus::Pending));
        assert_eq!(req.status, RequestStatus::Accepted);
    }

    #[test]
    fn resolve_to_pending_is_rejected() {
        let mut req = request();
        assert!(!req.resolve(RequestStatus::Pending));
        assert_eq!(req.status, RequestStatus::Pending);
    }

    #[test]
    fn priority_is_clamped() {
        let req = NegotiationRequest::new("c", ClauseType::Payment, "", "", "", 14);
        assert_eq!(req.priority, 10);
        let req = NegotiationRequest::new("c", ClauseType::Payment, "", "", "", 0);
        assert_eq!(req.priority, 1);
    }

    #[test]
    fn success_rate_counts_accepted_over_total() {
        let strategy = Strategy {
            overall_approach: String::new(),
            priorities: vec![],
            walk_away_conditions: vec![],
            compromise_positions: BTreeMap::new(),
            rounds: vec![RoundPlan::default(); 3],
            estimated_timeline: String::new(),
            success_probability: 50,
            created_at: Utc::now(),
        };
        let mut session = NegotiationSession::new("c1", "u1", strategy);
        assert_eq!(session.success_rate(), 0.0);

        let mut a = request();
        a.resolve(RequestStatus::Accepted);
        let mut b = request();
        b.resolve(RequestStatus::Rejected);
        session.rounds.push(NegotiationRound::new(1, vec![a, b]));
        session.refresh_counters();

        assert_eq!(session.requests_made, 2);
        assert_eq!(session.accepted_count, 1);
        assert_eq!(session.rejected_count, 1);
        assert_eq!(session.success_rate(), 0.5);
    }

    #[test]
    fn session_status_classification() {
        assert!(SessionStatus::AwaitingResponse.is_active());
        assert!(!SessionStatus::Completed.is_active());
        assert!(SessionStatus::Stalled.is_terminal());
        assert!(!SessionStatus::InProgress.is_terminal());
    }

    #[test]
    fn round_plan_lookup_is_one_based() {
        let strategy = Strategy {
            overall_approach: String::new(),
            priorities: vec![],
            walk_away_conditions: vec![],
            compromise_positions: BTreeMap::new(),
            rounds: vec![
                RoundPlan {
                    objective: "first".into(),
                    ..Default::default()
                },
                RoundPlan {
                    objective: "second".into(),
                    ..Default::default()
                },
            ],
            estimated_timeline: String::new(),
            success_probability: 0,
            created_at: Utc::now(),
        };
        assert_eq!(strategy.round_plan(1).unwrap().objective, "first");
        assert_eq!(strategy.round_plan(2).unwrap().objective, "second");
        assert!(strategy.round_plan(3).is_none());
        assert!(strategy.round_plan(0).is_none());
    }
}
