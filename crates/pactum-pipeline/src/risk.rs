//! Per-clause risk scoring and contract-level aggregation.

use futures::StreamExt;
use futures::stream;
use pactum_ai::TextGenerator;
use pactum_core::{Clause, ModelJson, PipelineConfig, RiskLevel, RiskReport, UserContext};
use serde::Deserialize;
use tracing::warn;

use crate::prompts;

const RISK_TEMPERATURE: f32 = 0.3;
const RISK_MAX_TOKENS: u32 = 1000;

/// Neutral defaults used when a clause analysis cannot be obtained. A
/// failure on one clause never aborts its siblings.
const NEUTRAL_SCORE: f64 = 5.0;

/// Shape the analysis prompt asks the model to return.
#[derive(Deserialize)]
struct Assessment {
    risk_score: f64,
    #[serde(default)]
    concerns: Vec<String>,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    severity: Option<RiskLevel>,
}

/// Score every clause through the generation service and aggregate into a
/// risk report.
///
/// Clause analyses are independent and run concurrently, bounded by
/// `config.clause_concurrency`; input order is preserved in the report.
pub async fn score_clauses(
    generator: &dyn TextGenerator,
    contract_id: &str,
    clauses: Vec<Clause>,
    ctx: &UserContext,
    config: &PipelineConfig,
) -> RiskReport {
    let scored: Vec<Clause> = stream::iter(
        clauses
            .into_iter()
            .map(|clause| assess_clause(generator, clause, ctx, config)),
    )
    .buffered(config.clause_concurrency.max(1))
    .collect()
    .await;

    build_report(contract_id, scored)
}

async fn assess_clause(
    generator: &dyn TextGenerator,
    mut clause: Clause,
    ctx: &UserContext,
    config: &PipelineConfig,
) -> Clause {
    let prompt = prompts::risk_analysis(&clause, ctx);
    let outcome = tokio::time::timeout(
        config.generation_timeout,
        generator.generate(&prompt, RISK_TEMPERATURE, RISK_MAX_TOKENS),
    )
    .await;

    match outcome {
        Ok(Ok(raw)) => apply_assessment(&mut clause, &raw),
        Ok(Err(err)) => {
            warn!(clause_id = %clause.id, error = %err, "clause analysis failed");
            apply_failure(&mut clause, format!("Analysis error: {err}"));
        }
        Err(_) => {
            warn!(clause_id = %clause.id, "clause analysis timed out");
            apply_failure(&mut clause, "Analysis error: generation timed out".into());
        }
    }
    clause
}

fn apply_assessment(clause: &mut Clause, raw: &str) {
    match ModelJson::extract(raw).decode::<Assessment>() {
        Some(assessment) => {
            clause.risk_score = Some(assessment.risk_score);
            clause.risk_level = Some(assessment.severity.unwrap_or(RiskLevel::Medium));
            clause.concerns = assessment.concerns;
            clause.impact = assessment.impact;
        }
        None => {
            clause.risk_score = Some(NEUTRAL_SCORE);
            clause.risk_level = Some(RiskLevel::Medium);
            clause.concerns = vec!["Unable to parse analysis".into()];
            // Keep the raw text; it may still be useful to a human reviewer.
            clause.impact = Some(raw.to_string());
        }
    }
}

fn apply_failure(clause: &mut Clause, concern: String) {
    clause.risk_score = Some(NEUTRAL_SCORE);
    clause.risk_level = Some(RiskLevel::Medium);
    clause.concerns = vec![concern];
    clause.impact = Some("Unknown".into());
}

fn build_report(contract_id: &str, clauses: Vec<Clause>) -> RiskReport {
    let overall_score = overall_score(&clauses);
    let overall_level = if clauses.is_empty() {
        RiskLevel::Unknown
    } else {
        RiskLevel::from_overall_score(overall_score)
    };

    let mut report = RiskReport {
        contract_id: contract_id.to_string(),
        clauses,
        overall_score,
        overall_level,
        summary: String::new(),
        analyzed_at: chrono::Utc::now(),
    };
    report.summary = summarize(&report);
    report
}

/// Severity-weighted mean: weight 1 below 4, 2 in [4, 7), 3 at 7 and above,
/// rounded to one decimal. Higher-risk clauses count more.
fn overall_score(clauses: &[Clause]) -> f64 {
    if clauses.is_empty() {
        return 0.0;
    }
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for clause in clauses {
        let score = clause.risk_score.unwrap_or(0.0);
        let weight = if score < 4.0 {
            1.0
        } else if score < 7.0 {
            2.0
        } else {
            3.0
        };
        weighted_sum += score * weight;
        total_weight += weight;
    }
    let mean = weighted_sum / total_weight;
    (mean * 10.0).round() / 10.0
}

fn summarize(report: &RiskReport) -> String {
    let high: Vec<&Clause> = report.high_risk().collect();
    let medium_count = report.medium_risk().count();

    let mut summary = format!(
        "Overall Risk: {} ({}/10)\n\n",
        report.overall_level.as_str(),
        report.overall_score
    );

    if !high.is_empty() {
        summary.push_str(&format!("{} HIGH-RISK clause(s) identified:\n", high.len()));
        for clause in &high {
            summary.push_str(&format!(
                "  - {}: {}\n",
                clause.clause_type.as_str(),
                clause.concerns.join(", ")
            ));
        }
        summary.push('\n');
    }

    if medium_count > 0 {
        summary.push_str(&format!(
            "{medium_count} MEDIUM-RISK clause(s) that could be improved.\n\n"
        ));
    }

    let recommendation = match report.overall_level {
        RiskLevel::High | RiskLevel::Critical => "Negotiate key terms before signing.",
        RiskLevel::Medium => "Consider requesting specific improvements.",
        _ => "Contract appears reasonable with minor concerns.",
    };
    summary.push_str(&format!("RECOMMENDATION: {recommendation}"));
    summary
}
