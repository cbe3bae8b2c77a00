//! Static clause exemplar library.
//!
//! Serves as the fallback corpus when no knowledge retriever is configured
//! or retrieval fails. Covers the six clause types the product ships
//! reference language for; other types return no exemplars and the
//! recommendation engine degrades to its deterministic templates.

use async_trait::async_trait;
use pactum_core::ClauseType;

use crate::retrieve::{Exemplar, KnowledgeRetriever, RetrieveError};

/// Built-in reference clauses for a clause type, best first.
pub fn fallback_exemplars(clause_type: ClauseType) -> Vec<Exemplar> {
    let entries: &[(&str, f32)] = match clause_type {
        ClauseType::Liability => &[
            (
                "Provider's total liability under this Agreement shall not exceed the total \
                 fees paid by Customer in the 12 months preceding the claim.",
                0.9,
            ),
            (
                "In no event shall either party be liable for indirect, incidental, special, \
                 or consequential damages.",
                0.85,
            ),
        ],
        ClauseType::Ip => &[(
            "Each party retains all rights, title, and interest in its pre-existing \
             intellectual property. Customer retains ownership of Customer Data.",
            0.9,
        )],
        ClauseType::Payment => &[(
            "Customer shall pay all undisputed invoices within 30 days of receipt.",
            0.9,
        )],
        ClauseType::Termination => &[(
            "Either party may terminate this Agreement with 30 days written notice. \
             Customer may terminate immediately for material breach if not cured within \
             30 days.",
            0.9,
        )],
        ClauseType::Confidentiality => &[(
            "Each party shall protect Confidential Information with the same degree of \
             care used for its own confidential information, but no less than reasonable \
             care.",
            0.9,
        )],
        ClauseType::DataProtection => &[(
            "Provider shall comply with all applicable data protection laws and \
             regulations, including GDPR and CCPA where applicable.",
            0.9,
        )],
        _ => &[],
    };

    entries
        .iter()
        .map(|&(text, score)| Exemplar {
            text: text.to_string(),
            score,
            source: "industry_standard".to_string(),
        })
        .collect()
}

/// [`KnowledgeRetriever`] backed by the static library.
///
/// Queries are expected in the form the recommendation engine issues
/// (`"standard <type> clause for <industry> industry"`); the clause type is
/// recovered by keyword match. Unrecognised queries report the corpus as
/// unavailable so the caller takes its normal fallback path.
pub struct StaticClauseLibrary;

#[async_trait]
impl KnowledgeRetriever for StaticClauseLibrary {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Exemplar>, RetrieveError> {
        let lowered = query.to_lowercase();
        let clause_type = [
            ClauseType::Liability,
            ClauseType::Ip,
            ClauseType::Payment,
            ClauseType::Termination,
            ClauseType::Confidentiality,
            ClauseType::DataProtection,
        ]
        .into_iter()
        .find(|t| lowered.contains(&format!("standard {} clause", t.as_str().to_lowercase())))
        .ok_or_else(|| RetrieveError::Unavailable(format!("no library entry for: {query}")))?;

        let mut exemplars = fallback_exemplars(clause_type);
        exemplars.truncate(top_k);
        Ok(exemplars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_built_in_types_have_exemplars() {
        for clause_type in [
            ClauseType::Liability,
            ClauseType::Ip,
            ClauseType::Payment,
            ClauseType::Termination,
            ClauseType::Confidentiality,
            ClauseType::DataProtection,
        ] {
            assert!(
                !fallback_exemplars(clause_type).is_empty(),
                "{} should have exemplars",
                clause_type.as_str()
            );
        }
    }

    #[test]
    fn uncovered_types_are_empty() {
        assert!(fallback_exemplars(ClauseType::Warranty).is_empty());
        assert!(fallback_exemplars(ClauseType::Other).is_empty());
    }

    #[test]
    fn exemplars_are_ordered_best_first() {
        let exemplars = fallback_exemplars(ClauseType::Liability);
        assert_eq!(exemplars.len(), 2);
        assert!(exemplars[0].score >= exemplars[1].score);
        assert_eq!(exemplars[0].source, "industry_standard");
    }

    #[tokio::test]
    async fn library_retrieves_by_query_keyword() {
        let library = StaticClauseLibrary;
        let results = library
            .retrieve("standard liability clause for SaaS industry", 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].text.contains("total liability"));
    }

    #[tokio::test]
    async fn library_respects_top_k() {
        let library = StaticClauseLibrary;
        let results = library
            .retrieve("standard liability clause for General industry", 1)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn unknown_query_is_unavailable() {
        let library = StaticClauseLibrary;
        let result = library.retrieve("standard force majeure clause", 5).await;
        assert!(matches!(result, Err(RetrieveError::Unavailable(_))));
    }
}
