//! Pipeline orchestration: the public operations over contracts and
//! sessions.
//!
//! [`Pipeline`] is an explicitly constructed context object holding every
//! external collaborator; there is no ambient global state. Components
//! stay stateless; entities live in the stores and flow through as values.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use pactum_ai::{KnowledgeRetriever, TextGenerator};
use pactum_core::{ContractRecord, ContractStatus, NegotiationRequest, NegotiationRound,
    NegotiationSession, ParsedContract, PipelineConfig, RiskReport, SessionStatus,
    UserPriorities};
use pactum_extract::TextExtractor;
use pactum_store::{ContractStore, SessionStore};
use tracing::{error, info};

use crate::draft::draft_message;
use crate::error::PipelineError;
use crate::recommend::recommend;
use crate::risk::score_clauses;
use crate::segment;
use crate::session::{ResponseOutcome, process_response};
use crate::strategy;

const DEFAULT_TONE: &str = "collaborative";

/// Dependency-injected pipeline context.
pub struct Pipeline {
    generator: Arc<dyn TextGenerator>,
    retriever: Option<Arc<dyn KnowledgeRetriever>>,
    extractor: Option<Arc<dyn TextExtractor>>,
    contracts: Arc<dyn ContractStore>,
    sessions: Arc<dyn SessionStore>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        contracts: Arc<dyn ContractStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            generator,
            retriever: None,
            extractor: None,
            contracts,
            sessions,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn KnowledgeRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Pull a contract's text through the extraction service and store the
    /// parsed structure. Extraction failure is fatal: the contract is left
    /// in ERROR status and the error propagates.
    pub async fn ingest_document(
        &self,
        contract_id: &str,
        location: &str,
    ) -> Result<ParsedContract, PipelineError> {
        let extractor = self
            .extractor
            .as_ref()
            .ok_or(PipelineError::ExtractorUnavailable)?;
        let mut record = self.contracts.get(contract_id).await?;

        let text = match extractor.extract(location).await {
            Ok(text) => text,
            Err(err) => {
                error!(contract_id, error = %err, "document extraction failed");
                self.contracts
                    .set_status(contract_id, ContractStatus::Error)
                    .await?;
                return Err(err.into());
            }
        };

        let parsed = segment::parse_contract(&text);
        record.full_text = Some(text);
        record.parsed = Some(parsed.clone());
        self.contracts.put(record).await?;
        info!(
            contract_id,
            kind = parsed.kind.as_str(),
            clauses = parsed.clauses.len(),
            "document ingested"
        );
        Ok(parsed)
    }

    /// Segment, score, and enrich one contract, producing a new risk
    /// report. The contract ends in REVIEWED or NEEDS_NEGOTIATION, or in
    /// ERROR when a fatal step fails.
    pub async fn analyze_contract(&self, contract_id: &str) -> Result<RiskReport, PipelineError> {
        let record = self.contracts.get(contract_id).await?;
        let text = record
            .full_text
            .clone()
            .ok_or_else(|| PipelineError::MissingText(contract_id.to_string()))?;

        self.contracts
            .set_status(contract_id, ContractStatus::Analyzing)
            .await?;

        match self.analyze_inner(contract_id, &text, &record).await {
            Ok(report) => Ok(report),
            Err(err) => {
                error!(contract_id, error = %err, "analysis failed");
                // Best effort: never leave the contract silently stale.
                let _ = self
                    .contracts
                    .set_status(contract_id, ContractStatus::Error)
                    .await;
                Err(err)
            }
        }
    }

    async fn analyze_inner(
        &self,
        contract_id: &str,
        text: &str,
        record: &ContractRecord,
    ) -> Result<RiskReport, PipelineError> {
        let parsed = record
            .parsed
            .clone()
            .unwrap_or_else(|| segment::parse_contract(text));

        let mut report = score_clauses(
            self.generator.as_ref(),
            contract_id,
            parsed.clauses.clone(),
            &record.user_context,
            &self.config,
        )
        .await;

        // Attach alternative language to the high-risk clauses, fanning
        // out per clause like the scorer does.
        let threshold = self.config.negotiation_score_threshold;
        let generator = self.generator.as_ref();
        let retriever = self.retriever.as_deref();
        let ctx = &record.user_context;
        let config = &self.config;
        report.clauses = stream::iter(report.clauses.into_iter().map(|mut clause| async move {
            if clause.risk_score.unwrap_or(0.0) >= threshold {
                let alternatives = recommend(generator, retriever, &clause, ctx, config).await;
                clause.alternatives = alternatives;
            }
            clause
        }))
        .buffered(self.config.clause_concurrency.max(1))
        .collect()
        .await;

        self.contracts
            .attach_report(contract_id, report.clone())
            .await?;

        let final_status = if report.overall_score >= threshold {
            ContractStatus::NeedsNegotiation
        } else {
            ContractStatus::Reviewed
        };
        self.contracts.set_status(contract_id, final_status).await?;

        info!(
            contract_id,
            overall_score = report.overall_score,
            overall_level = report.overall_level.as_str(),
            status = final_status.as_str(),
            "analysis complete"
        );
        Ok(report)
    }

    /// Plan a negotiation for an analysed contract: create a session with
    /// a fresh strategy and its first round, draft included. At most one
    /// active session exists per contract.
    pub async fn plan_negotiation(
        &self,
        contract_id: &str,
        priorities: &UserPriorities,
        history: &[NegotiationRound],
    ) -> Result<NegotiationSession, PipelineError> {
        let mut record = self.contracts.get(contract_id).await?;
        let report = record
            .latest_report()
            .cloned()
            .ok_or_else(|| PipelineError::NotAnalyzed(contract_id.to_string()))?;

        if let Some(active) = self.sessions.active_for_contract(contract_id).await? {
            return Err(PipelineError::InvalidState(format!(
                "contract {contract_id} already has active session {}",
                active.id
            )));
        }

        let planned = strategy::plan(
            self.generator.as_ref(),
            &report,
            priorities,
            history,
            &self.config,
        )
        .await?;

        let mut session = NegotiationSession::new(contract_id, record.user_id.clone(), planned);
        let requests = first_round_requests(&session, &report);
        let draft = draft_message(
            self.generator.as_ref(),
            &session.strategy.overall_approach,
            &requests,
            DEFAULT_TONE,
            &self.config,
        )
        .await?;

        let mut round = NegotiationRound::new(1, requests);
        round.outbound_draft = Some(draft);
        session.status = SessionStatus::AwaitingResponse;

        self.sessions.create(session.clone()).await?;
        self.sessions.append_round(&session.id, round).await?;

        record.negotiation_session_id = Some(session.id.clone());
        record.status = ContractStatus::Negotiating;
        self.contracts.put(record).await?;

        info!(contract_id, session_id = %session.id, "negotiation planned");
        self.sessions.get(&session.id).await.map_err(Into::into)
    }

    /// Process one counterparty response: classify, update request
    /// statuses, decide the next action, and persist, all as one result.
    pub async fn process_counterparty_response(
        &self,
        session_id: &str,
        response_text: &str,
    ) -> Result<ResponseOutcome, PipelineError> {
        let mut session = self.sessions.get(session_id).await?;
        let loaded_rounds = session.rounds.len();

        let outcome = process_response(
            self.generator.as_ref(),
            &mut session,
            response_text,
            &self.config,
        )
        .await?;

        // Conditional on the round count we loaded: a concurrent writer on
        // the same session surfaces as a RoundConflict instead of a lost
        // update.
        self.sessions.update(session, loaded_rounds).await?;
        Ok(outcome)
    }
}

/// Requests for round 1: the strategy's opening plan, or, when planning
/// degraded to a placeholder, the report's high-risk clauses with their
/// best alternative language.
fn first_round_requests(
    session: &NegotiationSession,
    report: &RiskReport,
) -> Vec<NegotiationRequest> {
    let planned: Vec<NegotiationRequest> = session
        .strategy
        .round_plan(1)
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
                        8,
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    if !planned.is_empty() {
        return planned;
    }

    report
        .high_risk()
        .map(|clause| {
            let alternative = clause.alternatives.first();
            NegotiationRequest::new(
                clause.id.clone(),
                clause.clause_type,
                clause.text.clone(),
                alternative
                    .map(|a| a.proposed_text.clone())
                    .unwrap_or_else(|| "Request industry-standard language.".into()),
                alternative
                    .map(|a| a.rationale.clone())
                    .unwrap_or_else(|| clause.concerns.join(", ")),
                clause.risk_score.unwrap_or(5.0).round().clamp(1.0, 10.0) as u8,
            )
        })
        .collect()
}
