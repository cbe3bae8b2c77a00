//! Outbound negotiation message drafting.
//!
//! Drafts are produced for human review only: every draft is created in
//! `PendingApproval` status and nothing in this crate sends anything.

use chrono::Utc;
use pactum_ai::{GenerateError, TextGenerator};
use pactum_core::{DraftStatus, ModelJson, NegotiationRequest, OutboundDraft, PipelineConfig};
use serde::Deserialize;
use tracing::warn;

use crate::prompts;

const DRAFT_TEMPERATURE: f32 = 0.6;
const DRAFT_MAX_TOKENS: u32 = 2000;
const FALLBACK_SUBJECT: &str = "Contract Review - Requested Changes";

#[derive(Deserialize)]
struct DraftDoc {
    subject: String,
    body: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    tone_check: Option<String>,
}

/// Draft the outbound message for a round's requests.
///
/// Generation failure propagates (retryable by the caller); unparseable
/// output degrades to a fixed subject with the raw model text as body.
pub async fn draft_message(
    generator: &dyn TextGenerator,
    overall_approach: &str,
    requests: &[NegotiationRequest],
    tone: &str,
    config: &PipelineConfig,
) -> Result<OutboundDraft, GenerateError> {
    let prompt = prompts::outbound_message(overall_approach, requests, tone);
    let raw = tokio::time::timeout(
        config.generation_timeout,
        generator.generate(&prompt, DRAFT_TEMPERATURE, DRAFT_MAX_TOKENS),
    )
    .await
    .map_err(|_| GenerateError::Timeout)??;

    let draft = match ModelJson::extract(&raw).decode::<DraftDoc>() {
        Some(doc) => OutboundDraft {
            subject: doc.subject,
            body: doc.body,
            key_points: doc.key_points,
            tone: doc.tone_check.unwrap_or_else(|| tone.to_string()),
            status: DraftStatus::PendingApproval,
            created_at: Utc::now(),
        },
        None => {
            warn!("draft output unparseable, using raw text as body");
            OutboundDraft {
                subject: FALLBACK_SUBJECT.into(),
                body: raw,
                key_points: Vec::new(),
                tone: tone.to_string(),
                status: DraftStatus::PendingApproval,
                created_at: Utc::now(),
            }
        }
    };
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pactum_core::ClauseType;

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, GenerateError> {
            Ok(self.0.to_string())
        }
    }

    fn requests() -> Vec<NegotiationRequest> {
        vec![NegotiationRequest::new(
            "liability_1",
            ClauseType::Liability,
            "unlimited liability",
            "cap at 12 months of fees",
            "industry standard",
            9,
        )]
    }

    #[tokio::test]
    async fn well_formed_output_becomes_draft() {
        let generator = FixedGenerator(
            r#"{"subject": "Proposed contract adjustments",
                "body": "Dear team, we would like to discuss...",
                "key_points": ["liability cap"],
                "tone_check": "collaborative"}"#,
        );
        let draft = draft_message(
            &generator,
            "lead with liability",
            &requests(),
            "collaborative",
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(draft.subject, "Proposed contract adjustments");
        assert_eq!(draft.key_points, vec!["liability cap"]);
        assert_eq!(draft.status, DraftStatus::PendingApproval);
    }

    #[tokio::test]
    async fn unparseable_output_falls_back_to_fixed_subject() {
        let generator = FixedGenerator("Dear counterparty, please accept our requests.");
        let draft = draft_message(
            &generator,
            "lead with liability",
            &requests(),
            "firm",
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(draft.subject, FALLBACK_SUBJECT);
        assert_eq!(draft.body, "Dear counterparty, please accept our requests.");
        assert!(draft.key_points.is_empty());
        assert_eq!(draft.tone, "firm");
        assert_eq!(draft.status, DraftStatus::PendingApproval);
    }
}
