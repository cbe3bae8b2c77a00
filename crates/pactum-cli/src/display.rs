//! Terminal rendering for reports, sessions, and response outcomes.

use pactum_core::{NegotiationSession, RiskReport};
use pactum_pipeline::{NextAction, ResponseOutcome};

/// Print a risk report as a vertical card grouped by risk bucket.
pub fn print_report(report: &RiskReport) {
    println!("=== Risk Report: {} ===", report.contract_id);
    println!(
        "  {:<22} {} ({}/10)",
        "overall",
        report.overall_level.as_str(),
        report.overall_score
    );
    println!("  {:<22} {}", "clauses", report.clauses.len());
    println!();

    print_bucket("High risk", report.high_risk());
    print_bucket("Medium risk", report.medium_risk());
    print_bucket("Low risk", report.low_risk());

    println!("{}", report.summary);
}

fn print_bucket<'a>(header: &str, clauses: impl Iterator<Item = &'a pactum_core::Clause>) {
    let clauses: Vec<_> = clauses.collect();
    if clauses.is_empty() {
        return;
    }
    println!("{header}");
    for clause in clauses {
        println!(
            "  {:<22} {:.1}  {}",
            clause.clause_type.as_str(),
            clause.risk_score.unwrap_or(0.0),
            clause.concerns.join("; ")
        );
        for alternative in &clause.alternatives {
            println!(
                "    alt {} ({:?}): {}",
                alternative.priority, alternative.likelihood_accepted, alternative.proposed_text
            );
        }
    }
    println!();
}

/// Print a planned negotiation session: strategy, round 1, and the draft
/// awaiting approval.
pub fn print_session(session: &NegotiationSession) {
    println!("=== Negotiation Session: {} ===", session.id);
    println!("  {:<22} {}", "status", session.status.as_str());
    println!("  {:<22} {}", "approach", session.strategy.overall_approach);
    println!(
        "  {:<22} {}%",
        "success probability", session.strategy.success_probability
    );
    if !session.strategy.walk_away_conditions.is_empty() {
        println!(
            "  {:<22} {}",
            "walk-away",
            session.strategy.walk_away_conditions.join("; ")
        );
    }
    println!();

    for plan in &session.strategy.rounds {
        println!("Round plan: {}", plan.objective);
        for request in &plan.requests {
            println!(
                "  {:<22} {} (likelihood {}%)",
                request.clause_type.as_str(),
                request.request,
                request.acceptance_likelihood
            );
        }
    }
    println!();

    if let Some(round) = session.current_round() {
        println!("Round {} requests:", round.round_number);
        for request in &round.requests {
            println!(
                "  [{}] {:<22} {}",
                request.priority,
                request.clause_type.as_str(),
                request.proposed_text
            );
        }
        if let Some(draft) = &round.outbound_draft {
            println!();
            println!("Draft (pending approval)");
            println!("  Subject: {}", draft.subject);
            println!("  {}", draft.body);
        }
    }
}

/// Print the outcome of processing a counterparty response.
pub fn print_outcome(outcome: &ResponseOutcome) {
    println!("=== Response Processed ===");
    for request in &outcome.updated_requests {
        println!(
            "  {:<22} {:<10} {}",
            request.clause_type.as_str(),
            request.status.as_str(),
            request.proposed_text
        );
    }
    println!();

    match &outcome.next_action {
        NextAction::AdvanceRound { round_number } => {
            println!("Next action: advance to round {round_number}");
        }
        NextAction::Compromise { positions } => {
            println!("Next action: offer compromises");
            for position in positions {
                println!("  - {position}");
            }
        }
        NextAction::WalkAway { conditions } => {
            println!("Next action: walk away");
            for condition in conditions {
                println!("  - {condition}");
            }
        }
        NextAction::RecommendApproval => {
            println!("Next action: recommend final approval");
        }
    }

    if let Some(draft) = &outcome.draft {
        println!();
        println!("Next draft (pending approval)");
        println!("  Subject: {}", draft.subject);
        println!("  {}", draft.body);
    }
}
