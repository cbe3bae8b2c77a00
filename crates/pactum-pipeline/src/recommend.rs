//! Alternative-clause recommendation with tiered degradation.
//!
//! Tier 1: knowledge-corpus exemplars + generation. Tier 2: static library
//! exemplars + generation. Tier 3: deterministic templates. The engine
//! never returns an empty list: a clause with no usable generation output
//! still gets at least a "consult counsel" placeholder.

use pactum_ai::{Exemplar, KnowledgeRetriever, TextGenerator, fallback_exemplars};
use pactum_core::{Alternative, Clause, ClauseType, Likelihood, ModelJson, PipelineConfig,
    UserContext};
use serde::Deserialize;
use tracing::warn;

use crate::prompts;

const RECOMMEND_TEMPERATURE: f32 = 0.5;
const RECOMMEND_MAX_TOKENS: u32 = 2000;
const EXEMPLAR_TOP_K: usize = 5;
const EXEMPLARS_USED: usize = 3;

#[derive(Deserialize)]
struct RecommendationDoc {
    #[serde(default)]
    recommendations: Vec<Alternative>,
}

/// Produce 1–3 prioritized alternatives for a risky clause.
pub async fn recommend(
    generator: &dyn TextGenerator,
    retriever: Option<&dyn KnowledgeRetriever>,
    clause: &Clause,
    ctx: &UserContext,
    config: &PipelineConfig,
) -> Vec<Alternative> {
    let exemplars = gather_exemplars(retriever, clause.clause_type, &ctx.industry).await;
    let prompt = prompts::recommendations(clause, &exemplars, ctx);

    let generated = tokio::time::timeout(
        config.generation_timeout,
        generator.generate(&prompt, RECOMMEND_TEMPERATURE, RECOMMEND_MAX_TOKENS),
    )
    .await;

    let alternatives = match generated {
        Ok(Ok(raw)) => ModelJson::extract(&raw)
            .decode::<RecommendationDoc>()
            .map(|doc| doc.recommendations)
            .unwrap_or_default(),
        Ok(Err(err)) => {
            warn!(clause_id = %clause.id, error = %err, "recommendation generation failed");
            Vec::new()
        }
        Err(_) => {
            warn!(clause_id = %clause.id, "recommendation generation timed out");
            Vec::new()
        }
    };

    if alternatives.is_empty() {
        template_alternatives(clause.clause_type)
    } else {
        alternatives
    }
}

/// Query the corpus if one is configured; any failure or absence falls
/// back to the static library. The top three exemplars by relevance feed
/// the prompt.
async fn gather_exemplars(
    retriever: Option<&dyn KnowledgeRetriever>,
    clause_type: ClauseType,
    industry: &str,
) -> Vec<Exemplar> {
    let mut exemplars = match retriever {
        Some(retriever) => {
            let query = format!(
                "standard {} clause for {} industry",
                clause_type.as_str().to_lowercase(),
                industry
            );
            match retriever.retrieve(&query, EXEMPLAR_TOP_K).await {
                Ok(results) => results,
                Err(err) => {
                    warn!(error = %err, "knowledge retrieval failed, using static library");
                    fallback_exemplars(clause_type)
                }
            }
        }
        None => fallback_exemplars(clause_type),
    };
    exemplars.truncate(EXEMPLARS_USED);
    exemplars
}

/// Deterministic last-resort suggestions keyed by clause type.
fn template_alternatives(clause_type: ClauseType) -> Vec<Alternative> {
    let (proposed_text, rationale, risk_reduction, likelihood) = match clause_type {
        ClauseType::Liability => (
            "Provider's total liability shall not exceed the fees paid in the 12 months \
             prior to the claim. Neither party shall be liable for indirect, incidental, \
             or consequential damages.",
            "Standard liability cap protects against unlimited exposure",
            "3",
            Likelihood::High,
        ),
        ClauseType::Payment => (
            "Customer shall pay undisputed invoices within 30 days of receipt.",
            "Standard payment terms in the industry",
            "4",
            Likelihood::High,
        ),
        ClauseType::Termination => (
            "Either party may terminate with 30 days written notice. Either party may \
             terminate immediately for material breach not cured within 30 days.",
            "Mutual termination rights with cure period",
            "4",
            Likelihood::Medium,
        ),
        _ => (
            "Consult legal counsel for appropriate clause language.",
            "Unable to generate specific recommendation",
            "Unknown",
            Likelihood::Unknown,
        ),
    };

    vec![Alternative {
        priority: 1,
        proposed_text: proposed_text.into(),
        rationale: rationale.into(),
        risk_reduction: risk_reduction.into(),
        likelihood_accepted: likelihood,
    }]
}
