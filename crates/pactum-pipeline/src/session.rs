//! Negotiation session state machine.
//!
//! One call to [`process_response`] performs the whole logical transition
//! for a counterparty response: classify every outstanding request of the
//! current round, apply one-way status updates, recompute counters, decide
//! the next action, and, when the session advances, plan the next round
//! with its outbound draft. The caller persists the mutated session and
//! the returned outcome as a single result.

use pactum_ai::TextGenerator;
use pactum_core::{ClauseType, ModelJson, NegotiationRequest, NegotiationRound,
    NegotiationSession, OutboundDraft, PipelineConfig, RequestStatus, SessionStatus};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::draft::draft_message;
use crate::error::PipelineError;
use crate::prompts;

const CLASSIFY_TEMPERATURE: f32 = 0.3;
const CLASSIFY_MAX_TOKENS: u32 = 1500;
const DEFAULT_TONE: &str = "collaborative";

/// What the pipeline recommends after processing a counterparty response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NextAction {
    /// Substantial progress: continue with the next round.
    AdvanceRound { round_number: u32 },
    /// Offer the remaining fallback positions before giving up.
    Compromise { positions: Vec<String> },
    /// Recommend abandoning the negotiation.
    WalkAway { conditions: Vec<String> },
    /// Everything material is settled: recommend final approval.
    RecommendApproval,
}

/// The single visible result of processing one counterparty response:
/// updated request statuses, the decided next action, and the next round's
/// draft when one was produced.
#[derive(Debug, Clone)]
pub struct ResponseOutcome {
    pub updated_requests: Vec<NegotiationRequest>,
    pub next_action: NextAction,
    pub draft: Option<OutboundDraft>,
}

/// Shape the classification prompt asks the model to return.
#[derive(Debug, Default, Deserialize)]
struct Classification {
    #[serde(default)]
    accepted_requests: Vec<String>,
    #[serde(default)]
    rejected_requests: Vec<String>,
    #[serde(default)]
    counter_offers: Vec<CounterOffer>,
}

#[derive(Debug, Deserialize)]
struct CounterOffer {
    request_id: String,
    #[serde(default)]
    their_counter: Option<String>,
}

/// Run the full response transition on a session that is awaiting one.
pub async fn process_response(
    generator: &dyn TextGenerator,
    session: &mut NegotiationSession,
    response_text: &str,
    config: &PipelineConfig,
) -> Result<ResponseOutcome, PipelineError> {
    if session.status != SessionStatus::AwaitingResponse {
        return Err(PipelineError::InvalidState(format!(
            "session {} is {}, not awaiting a response",
            session.id,
            session.status.as_str()
        )));
    }
    let round_index = session
        .rounds
        .len()
        .checked_sub(1)
        .ok_or_else(|| PipelineError::InvalidState(format!("session {} has no rounds", session.id)))?;
    if !session.rounds[round_index].is_open() {
        return Err(PipelineError::InvalidState(format!(
            "round {} was already resolved",
            session.rounds[round_index].round_number
        )));
    }

    let classification = classify(
        generator,
        &session.rounds[round_index].requests,
        response_text,
        config,
    )
    .await?;

    apply_classification(&mut session.rounds[round_index], &classification, response_text);
    session.refresh_counters();

    decide(generator, session, round_index, config).await
}

/// Classify each outstanding request as accepted/rejected/countered from
/// the response text. Unparseable model output degrades to an empty
/// classification: every request simply stays pending.
async fn classify(
    generator: &dyn TextGenerator,
    requests: &[NegotiationRequest],
    response_text: &str,
    config: &PipelineConfig,
) -> Result<Classification, PipelineError> {
    let prompt = prompts::response_classification(requests, response_text);
    let raw = tokio::time::timeout(
        config.generation_timeout,
        generator.generate(&prompt, CLASSIFY_TEMPERATURE, CLASSIFY_MAX_TOKENS),
    )
    .await
    .map_err(|_| pactum_ai::GenerateError::Timeout)??;

    Ok(ModelJson::extract(&raw)
        .decode::<Classification>()
        .unwrap_or_else(|| {
            warn!("classification output unparseable, leaving requests pending");
            Classification::default()
        }))
}

/// Apply one-way status updates and close the round. Requests that are
/// already resolved are skipped, making re-processing idempotent; requests
/// the response does not mention stay pending and carry forward.
fn apply_classification(
    round: &mut NegotiationRound,
    classification: &Classification,
    response_text: &str,
) {
    for request in &mut round.requests {
        if request.status.is_resolved() {
            continue;
        }
        if classification.accepted_requests.contains(&request.id) {
            request.resolve(RequestStatus::Accepted);
        } else if classification.rejected_requests.contains(&request.id) {
            request.resolve(RequestStatus::Rejected);
        } else if let Some(counter) = classification
            .counter_offers
            .iter()
            .find(|c| c.request_id == request.id)
        {
            request.resolve(RequestStatus::Countered);
            request.counterparty_response = Some(
                counter
                    .their_counter
                    .clone()
                    .unwrap_or_else(|| response_text.to_string()),
            );
        }
    }

    round.accepted = ids_with_status(round, RequestStatus::Accepted);
    round.rejected = ids_with_status(round, RequestStatus::Rejected);
    round.countered = ids_with_status(round, RequestStatus::Countered);
    round.counterparty_response = Some(response_text.to_string());
    round.completed_at = Some(chrono::Utc::now());
}

fn ids_with_status(round: &NegotiationRound, status: RequestStatus) -> Vec<String> {
    round
        .requests
        .iter()
        .filter(|r| r.status == status)
        .map(|r| r.id.clone())
        .collect()
}

/// Decide what happens after the round's statuses are settled.
async fn decide(
    generator: &dyn TextGenerator,
    session: &mut NegotiationSession,
    round_index: usize,
    config: &PipelineConfig,
) -> Result<ResponseOutcome, PipelineError> {
    let round = &session.rounds[round_index];
    let updated_requests = round.requests.clone();
    let round_number = round.round_number;
    let total = round.requests.len();
    let accepted = round.accepted.len();
    let rejected = round.rejected.len();
    let acceptance_rate = if total == 0 {
        0.0
    } else {
        accepted as f64 / total as f64
    };

    info!(
        session_id = %session.id,
        round = round_number,
        accepted,
        rejected,
        acceptance_rate,
        "counterparty response processed"
    );

    // Full acceptance ends the negotiation successfully.
    if total > 0 && accepted == total {
        session.status = SessionStatus::Accepted;
        session.completed_at = Some(chrono::Utc::now());
        session.final_recommendation =
            Some("All requests accepted. Recommend final approval.".into());
        return Ok(ResponseOutcome {
            updated_requests,
            next_action: NextAction::RecommendApproval,
            draft: None,
        });
    }

    // Substantial progress advances, while rounds remain and there is
    // still something to ask for.
    if acceptance_rate >= config.advance_threshold {
        if round_number < config.max_rounds {
            let requests = next_round_requests(session, round_number + 1);
            if !requests.is_empty() {
                let draft = draft_message(
                    generator,
                    &session.strategy.overall_approach,
                    &requests,
                    DEFAULT_TONE,
                    config,
                )
                .await?;
                let mut next_round =
                    NegotiationRound::new(round_number + 1, requests);
                next_round.outbound_draft = Some(draft.clone());
                session.rounds.push(next_round);
                session.refresh_counters();
                session.status = SessionStatus::AwaitingResponse;
                return Ok(ResponseOutcome {
                    updated_requests,
                    next_action: NextAction::AdvanceRound {
                        round_number: round_number + 1,
                    },
                    draft: Some(draft),
                });
            }
        }
        // Final round, or nothing left to request: close out on the gains.
        session.status = SessionStatus::Completed;
        session.completed_at = Some(chrono::Utc::now());
        session.final_recommendation = Some(format!(
            "Negotiation concluded with {accepted} of {total} requests accepted. \
             recommend approval of the agreed terms."
        ));
        return Ok(ResponseOutcome {
            updated_requests,
            next_action: NextAction::RecommendApproval,
            draft: None,
        });
    }

    // Below the advancement threshold: surface remaining compromises, or
    // recommend walking away when none are left.
    let positions = remaining_compromises(session, round_number);
    let out_of_rounds = round_number >= config.max_rounds;
    if positions.is_empty() || (out_of_rounds && total > 0 && rejected == total) {
        let conditions = walk_away_conditions(session);
        session.status = SessionStatus::Stalled;
        session.final_recommendation =
            Some("No acceptable path remains. Recommend walking away.".into());
        return Ok(ResponseOutcome {
            updated_requests,
            next_action: NextAction::WalkAway { conditions },
            draft: None,
        });
    }

    session.status = SessionStatus::InProgress;
    Ok(ResponseOutcome {
        updated_requests,
        next_action: NextAction::Compromise { positions },
        draft: None,
    })
}

/// Requests for the next round: the strategy's plan for that round when it
/// has one, otherwise the previous round's unresolved issues re-raised as
/// fresh requests.
fn next_round_requests(session: &NegotiationSession, round_number: u32) -> Vec<NegotiationRequest> {
    let planned: Vec<NegotiationRequest> = session
        .strategy
        .round_plan(round_number)
        .map(|plan| {
            plan.requests
                .iter()
                .map(|p| {
                    NegotiationRequest::new(
                        p.clause_id
                            .clone()
                            .unwrap_or_else(|| p.clause_type.as_str().to_lowercase()),
                        p.clause_type,
                        p.current_issue.clone(),
                        p.request.clone(),
                        p.rationale.clone(),
                        priority_for(session, p.clause_type),
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    if !planned.is_empty() {
        return planned;
    }

    // Carry unresolved issues forward as new requests; resolved requests
    // never reopen.
    session
        .rounds
        .iter()
        .rev()
        .find(|r| r.round_number == round_number - 1)
        .map(|previous| {
            previous
                .requests
                .iter()
                .filter(|r| r.status != RequestStatus::Accepted)
                .filter(|r| r.status != RequestStatus::Withdrawn)
                .map(|r| {
                    NegotiationRequest::new(
                        r.clause_id.clone(),
                        r.clause_type,
                        r.original_text.clone(),
                        r.proposed_text.clone(),
                        r.rationale.clone(),
                        r.priority,
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Priority from the strategy's ordered priority list: earlier entries
/// score higher; unlisted clause types sit in the middle.
fn priority_for(session: &NegotiationSession, clause_type: ClauseType) -> u8 {
    let name = clause_type.as_str().to_lowercase();
    session
        .strategy
        .priorities
        .iter()
        .position(|p| p.to_lowercase().contains(&name))
        .map(|index| (10u8.saturating_sub(index as u8)).max(1))
        .unwrap_or(5)
}

/// Compromise positions not yet consumed: round plans after the current
/// round plus the strategy-level compromise map.
fn remaining_compromises(session: &NegotiationSession, current_round: u32) -> Vec<String> {
    let mut positions: Vec<String> = session
        .strategy
        .rounds
        .iter()
        .skip(current_round as usize)
        .flat_map(|plan| plan.compromise_positions.iter().cloned())
        .collect();
    for (clause, position) in &session.strategy.compromise_positions {
        let entry = format!("{clause}: {position}");
        if !positions.contains(&entry) {
            positions.push(entry);
        }
    }
    positions
}

fn walk_away_conditions(session: &NegotiationSession) -> Vec<String> {
    let mut conditions = session.strategy.walk_away_conditions.clone();
    for plan in &session.strategy.rounds {
        for trigger in &plan.walk_away_triggers {
            if !conditions.contains(trigger) {
                conditions.push(trigger.clone());
            }
        }
    }
    conditions
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use pactum_ai::GenerateError;
    use pactum_core::{ClauseType, PlannedRequest, RoundPlan, Strategy};
    use std::collections::BTreeMap;

    /// Accepts/rejects/counters by request position, and answers draft
    /// prompts with a fixed JSON draft.
    struct ScriptedResponder {
        accepted: Vec<String>,
        rejected: Vec<String>,
        countered: Vec<String>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedResponder {
        async fn generate(
            &self,
            prompt: &str,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, GenerateError> {
            if prompt.contains("Draft a professional") {
                return Ok(r#"{"subject": "Round update", "body": "Hello", "key_points": []}"#
                    .into());
            }
            let counters: Vec<String> = self
                .countered
                .iter()
                .map(|id| format!("{{\"request_id\": \"{id}\", \"their_counter\": \"meet halfway\"}}"))
                .collect();
            Ok(format!(
                "{{\"accepted_requests\": {}, \"rejected_requests\": {}, \"counter_offers\": [{}]}}",
                serde_json::to_string(&self.accepted).unwrap(),
                serde_json::to_string(&self.rejected).unwrap(),
                counters.join(",")
            ))
        }
    }

    fn strategy(round2_requests: Vec<PlannedRequest>) -> Strategy {
        Strategy {
            overall_approach: "lead with liability".into(),
            priorities: vec!["liability".into()],
            walk_away_conditions: vec!["No liability cap".into()],
            compromise_positions: BTreeMap::new(),
            rounds: vec![
                RoundPlan {
                    objective: "quick wins".into(),
                    ..Default::default()
                },
                RoundPlan {
                    objective: "compromises".into(),
                    requests: round2_requests,
                    compromise_positions: vec!["offer 24-month cap".into()],
                    ..Default::default()
                },
                RoundPlan {
                    objective: "final".into(),
                    walk_away_triggers: vec!["Perpetual IP assignment".into()],
                    ..Default::default()
                },
            ],
            estimated_timeline: "2-3 weeks".into(),
            success_probability: 70,
            created_at: Utc::now(),
        }
    }

    fn request(clause: &str, clause_type: ClauseType) -> NegotiationRequest {
        NegotiationRequest::new(clause, clause_type, "current", "proposed", "because", 8)
    }

    fn awaiting_session(requests: Vec<NegotiationRequest>) -> NegotiationSession {
        let mut session = NegotiationSession::new("c1", "u1", strategy(vec![]));
        session.rounds.push(NegotiationRound::new(1, requests));
        session.refresh_counters();
        session.status = SessionStatus::AwaitingResponse;
        session
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[tokio::test]
    async fn full_acceptance_completes_the_session() {
        let a = request("liability_1", ClauseType::Liability);
        let b = request("payment_3", ClauseType::Payment);
        let generator = ScriptedResponder {
            accepted: vec![a.id.clone(), b.id.clone()],
            rejected: vec![],
            countered: vec![],
        };
        let mut session = awaiting_session(vec![a, b]);

        let outcome = process_response(&generator, &mut session, "We accept everything.", &config())
            .await
            .unwrap();

        assert!(matches!(outcome.next_action, NextAction::RecommendApproval));
        assert!(outcome.draft.is_none());
        assert_eq!(session.status, SessionStatus::Accepted);
        assert_eq!(session.accepted_count, 2);
        assert!(session.final_recommendation.is_some());
        assert!(
            outcome
                .updated_requests
                .iter()
                .all(|r| r.status == RequestStatus::Accepted)
        );
    }

    #[tokio::test]
    async fn substantial_progress_advances_with_a_draft() {
        let a = request("liability_1", ClauseType::Liability);
        let b = request("payment_3", ClauseType::Payment);
        let generator = ScriptedResponder {
            accepted: vec![a.id.clone()],
            rejected: vec![b.id.clone()],
            countered: vec![],
        };
        let mut session = awaiting_session(vec![a, b]);

        let outcome = process_response(
            &generator,
            &mut session,
            "We accept the liability change but not payment.",
            &config(),
        )
        .await
        .unwrap();

        // 1 of 2 accepted meets the default 0.5 threshold.
        assert!(matches!(
            outcome.next_action,
            NextAction::AdvanceRound { round_number: 2 }
        ));
        let draft = outcome.draft.unwrap();
        assert_eq!(draft.subject, "Round update");
        assert_eq!(session.status, SessionStatus::AwaitingResponse);
        assert_eq!(session.rounds.len(), 2);
        assert_eq!(session.rounds[1].round_number, 2);
        // The rejected payment request is re-raised, the accepted one is not.
        assert_eq!(session.rounds[1].requests.len(), 1);
        assert_eq!(session.rounds[1].requests[0].clause_type, ClauseType::Payment);
        assert!(session.rounds[1].outbound_draft.is_some());
    }

    #[tokio::test]
    async fn planned_round_requests_take_precedence_over_carryover() {
        let a = request("liability_1", ClauseType::Liability);
        let b = request("payment_3", ClauseType::Payment);
        let generator = ScriptedResponder {
            accepted: vec![a.id.clone()],
            rejected: vec![b.id.clone()],
            countered: vec![],
        };
        let mut session = awaiting_session(vec![a, b]);
        session.strategy = strategy(vec![PlannedRequest {
            clause_type: ClauseType::Termination,
            clause_id: None,
            current_issue: "5-day at-will termination".into(),
            request: "30 days notice with cure period".into(),
            rationale: "standard".into(),
            acceptance_likelihood: 70,
        }]);

        let outcome = process_response(&generator, &mut session, "Partially agreed.", &config())
            .await
            .unwrap();

        assert!(matches!(outcome.next_action, NextAction::AdvanceRound { .. }));
        assert_eq!(session.rounds[1].requests.len(), 1);
        assert_eq!(
            session.rounds[1].requests[0].clause_type,
            ClauseType::Termination
        );
    }

    #[tokio::test]
    async fn rejection_with_compromises_left_suggests_them() {
        let a = request("liability_1", ClauseType::Liability);
        let b = request("payment_3", ClauseType::Payment);
        let generator = ScriptedResponder {
            accepted: vec![],
            rejected: vec![a.id.clone(), b.id.clone()],
            countered: vec![],
        };
        let mut session = awaiting_session(vec![a, b]);

        let outcome = process_response(&generator, &mut session, "We decline all changes.", &config())
            .await
            .unwrap();

        match outcome.next_action {
            NextAction::Compromise { positions } => {
                assert!(positions.contains(&"offer 24-month cap".to_string()));
            }
            other => panic!("expected Compromise, got {other:?}"),
        }
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.rejected_count, 2);
    }

    #[tokio::test]
    async fn rejection_on_final_round_recommends_walk_away() {
        let a = request("liability_1", ClauseType::Liability);
        let generator = ScriptedResponder {
            accepted: vec![],
            rejected: vec![a.id.clone()],
            countered: vec![],
        };
        let mut session = awaiting_session(vec![]);
        session.rounds.clear();
        let mut round1 = NegotiationRound::new(1, vec![]);
        round1.completed_at = Some(Utc::now());
        let mut round2 = NegotiationRound::new(2, vec![]);
        round2.completed_at = Some(Utc::now());
        session.rounds.push(round1);
        session.rounds.push(round2);
        session.rounds.push(NegotiationRound::new(3, vec![a]));
        session.refresh_counters();
        session.status = SessionStatus::AwaitingResponse;

        let outcome = process_response(&generator, &mut session, "Final answer: no.", &config())
            .await
            .unwrap();

        match outcome.next_action {
            NextAction::WalkAway { conditions } => {
                assert!(conditions.contains(&"No liability cap".to_string()));
                assert!(conditions.contains(&"Perpetual IP assignment".to_string()));
            }
            other => panic!("expected WalkAway, got {other:?}"),
        }
        assert_eq!(session.status, SessionStatus::Stalled);
    }

    #[tokio::test]
    async fn counter_offers_record_their_text() {
        let a = request("liability_1", ClauseType::Liability);
        let b = request("payment_3", ClauseType::Payment);
        let generator = ScriptedResponder {
            accepted: vec![a.id.clone()],
            rejected: vec![],
            countered: vec![b.id.clone()],
        };
        let mut session = awaiting_session(vec![a, b]);

        let outcome = process_response(&generator, &mut session, "Counter on payment.", &config())
            .await
            .unwrap();

        let countered = outcome
            .updated_requests
            .iter()
            .find(|r| r.status == RequestStatus::Countered)
            .unwrap();
        assert_eq!(countered.counterparty_response.as_deref(), Some("meet halfway"));
    }

    #[tokio::test]
    async fn processing_twice_is_rejected_and_statuses_stand() {
        let a = request("liability_1", ClauseType::Liability);
        let a_id = a.id.clone();
        let generator = ScriptedResponder {
            accepted: vec![a_id.clone()],
            rejected: vec![],
            countered: vec![],
        };
        let mut session = awaiting_session(vec![a]);

        process_response(&generator, &mut session, "Accepted.", &config())
            .await
            .unwrap();
        let status_after_first = session.rounds[0]
            .requests
            .iter()
            .find(|r| r.id == a_id)
            .unwrap()
            .status;
        assert_eq!(status_after_first, RequestStatus::Accepted);

        // The session is no longer awaiting a response; replaying the same
        // text is a state error and no request returns to PENDING.
        let replay = process_response(&generator, &mut session, "Accepted.", &config()).await;
        assert!(matches!(replay, Err(PipelineError::InvalidState(_))));
        assert_eq!(
            session.rounds[0].requests[0].status,
            RequestStatus::Accepted
        );
    }

    #[tokio::test]
    async fn already_resolved_requests_are_skipped_on_reclassification() {
        // Direct check of the idempotent apply step: a resolved request is
        // not flipped even when a new classification contradicts it.
        let mut a = request("liability_1", ClauseType::Liability);
        a.resolve(RequestStatus::Accepted);
        let a_id = a.id.clone();
        let mut round = NegotiationRound::new(1, vec![a]);

        let classification = Classification {
            accepted_requests: vec![],
            rejected_requests: vec![a_id.clone()],
            counter_offers: vec![],
        };
        apply_classification(&mut round, &classification, "changed our mind");

        assert_eq!(round.requests[0].status, RequestStatus::Accepted);
        assert_eq!(round.accepted, vec![a_id]);
        assert!(round.rejected.is_empty());
    }

    #[tokio::test]
    async fn unparseable_classification_leaves_requests_pending() {
        struct ProseGenerator;

        #[async_trait]
        impl TextGenerator for ProseGenerator {
            async fn generate(
                &self,
                _prompt: &str,
                _temperature: f32,
                _max_tokens: u32,
            ) -> Result<String, GenerateError> {
                Ok("They seemed open to discussion but made no commitments.".into())
            }
        }

        let a = request("liability_1", ClauseType::Liability);
        let mut session = awaiting_session(vec![a]);

        let outcome = process_response(&ProseGenerator, &mut session, "Vague reply.", &config())
            .await
            .unwrap();

        assert_eq!(
            outcome.updated_requests[0].status,
            RequestStatus::Pending
        );
        // No acceptance, compromises remain → suggest them.
        assert!(matches!(outcome.next_action, NextAction::Compromise { .. }));
    }
}
