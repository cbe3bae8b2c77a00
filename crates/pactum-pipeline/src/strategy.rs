//! Multi-round negotiation strategy planning.

use std::collections::BTreeMap;

use chrono::Utc;
use pactum_ai::{GenerateError, TextGenerator};
use pactum_core::{ModelJson, NegotiationRound, PipelineConfig, RiskReport, RoundPlan, Strategy,
    UserPriorities};
use serde::Deserialize;
use tracing::warn;

use crate::prompts;

const STRATEGY_TEMPERATURE: f32 = 0.5;
const STRATEGY_MAX_TOKENS: u32 = 3000;
const PLACEHOLDER_TIMELINE: &str = "2-3 weeks";
const PLACEHOLDER_PROBABILITY: u8 = 50;

/// Shape the strategy prompt asks the model to return.
#[derive(Deserialize)]
struct StrategyDoc {
    round_1: RoundPlan,
    #[serde(default)]
    round_2: RoundPlan,
    #[serde(default)]
    round_3: RoundPlan,
    #[serde(default)]
    overall_strategy: String,
    #[serde(default)]
    walk_away_conditions: Vec<String>,
    #[serde(default)]
    compromise_positions: BTreeMap<String, String>,
    #[serde(default)]
    estimated_timeline: String,
    #[serde(default)]
    success_probability: u8,
}

/// Plan exactly three negotiation rounds from a risk report, the user's
/// priorities, and any prior rounds (formatted chronologically into the
/// prompt when re-planning).
///
/// Generation failure propagates: there is no useful strategy without the
/// model. Parse failure does not: it yields a minimally-structured
/// placeholder with empty request lists, so the caller can still open a
/// session and a human can take over.
pub async fn plan(
    generator: &dyn TextGenerator,
    report: &RiskReport,
    priorities: &UserPriorities,
    history: &[NegotiationRound],
    config: &PipelineConfig,
) -> Result<Strategy, GenerateError> {
    let prompt = prompts::negotiation_strategy(report, priorities, history);
    let raw = tokio::time::timeout(
        config.generation_timeout,
        generator.generate(&prompt, STRATEGY_TEMPERATURE, STRATEGY_MAX_TOKENS),
    )
    .await
    .map_err(|_| GenerateError::Timeout)??;

    let strategy = match ModelJson::extract(&raw).decode::<StrategyDoc>() {
        Some(doc) => from_doc(doc, priorities),
        None => {
            warn!("strategy output unparseable, emitting placeholder");
            placeholder(raw, priorities)
        }
    };
    Ok(strategy)
}

fn from_doc(doc: StrategyDoc, priorities: &UserPriorities) -> Strategy {
    // Walk-away conditions can arrive top-level or on round 3; merge both.
    let mut walk_away = doc.walk_away_conditions;
    for trigger in &doc.round_3.walk_away_triggers {
        if !walk_away.contains(trigger) {
            walk_away.push(trigger.clone());
        }
    }

    Strategy {
        overall_approach: doc.overall_strategy,
        priorities: ordered_priorities(priorities),
        walk_away_conditions: walk_away,
        compromise_positions: doc.compromise_positions,
        rounds: vec![doc.round_1, doc.round_2, doc.round_3],
        estimated_timeline: doc.estimated_timeline,
        success_probability: doc.success_probability.min(100),
        created_at: Utc::now(),
    }
}

/// Minimal structure for when the model's answer cannot be parsed: three
/// empty rounds with the standard objectives and the raw text preserved as
/// the overall approach.
fn placeholder(raw: String, priorities: &UserPriorities) -> Strategy {
    let objectives = ["Address high-risk clauses", "Compromises", "Final positions"];
    Strategy {
        overall_approach: raw,
        priorities: ordered_priorities(priorities),
        walk_away_conditions: Vec::new(),
        compromise_positions: BTreeMap::new(),
        rounds: objectives
            .iter()
            .map(|objective| RoundPlan {
                objective: (*objective).into(),
                ..Default::default()
            })
            .collect(),
        estimated_timeline: PLACEHOLDER_TIMELINE.into(),
        success_probability: PLACEHOLDER_PROBABILITY,
        created_at: Utc::now(),
    }
}

fn ordered_priorities(priorities: &UserPriorities) -> Vec<String> {
    priorities
        .must_haves
        .iter()
        .chain(priorities.nice_to_haves.iter())
        .cloned()
        .collect()
}
