//! Prompt templates for the generation service.
//!
//! Every prompt asks for a JSON answer; the callers run the reply through
//! [`pactum_core::ModelJson`] and fall back to documented defaults when the
//! model does not comply.

use pactum_ai::Exemplar;
use pactum_core::{Clause, NegotiationRequest, NegotiationRound, RiskReport, UserContext,
    UserPriorities};

/// Per-clause risk analysis prompt.
pub fn risk_analysis(clause: &Clause, ctx: &UserContext) -> String {
    format!(
        "Analyze this {clause_type} clause for business risk:\n\n\
         Clause Text:\n{text}\n\n\
         User Context:\n\
         - Industry: {industry}\n\
         - Company Size: {company_size}\n\
         - Risk Tolerance: {risk_tolerance}\n\n\
         Provide analysis in JSON format:\n\
         {{\n\
         \x20 \"risk_score\": 8,\n\
         \x20 \"concerns\": [\"Specific concern 1\", \"Specific concern 2\"],\n\
         \x20 \"impact\": \"Description of potential business impact\",\n\
         \x20 \"severity\": \"HIGH\"\n\
         }}\n\n\
         Risk Score Scale:\n\
         1-3: Low risk (standard industry terms)\n\
         4-6: Medium risk (somewhat unfavorable but acceptable)\n\
         7-9: High risk (significantly unfavorable)\n\
         10: Critical risk (could be catastrophic)",
        clause_type = clause.clause_type.as_str(),
        text = clause.text,
        industry = ctx.industry,
        company_size = ctx.company_size,
        risk_tolerance = ctx.risk_tolerance,
    )
}

/// Alternative-clause generation prompt: exactly three alternatives,
/// ordered aggressive → moderate → compromise.
pub fn recommendations(clause: &Clause, exemplars: &[Exemplar], ctx: &UserContext) -> String {
    let exemplar_block = exemplars
        .iter()
        .enumerate()
        .map(|(i, e)| format!("Example {} (relevance: {:.2}):\n{}", i + 1, e.score, e.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a contract negotiation expert. Analyze this {clause_type} clause and \
         provide alternative language.\n\n\
         Current Clause:\n{text}\n\n\
         Risk Score: {risk_score}/10\n\
         Concerns: {concerns}\n\n\
         User Context:\n\
         - Industry: {industry}\n\
         - Company Size: {company_size}\n\
         - Risk Tolerance: {risk_tolerance}\n\n\
         Industry Standard Examples:\n{exemplar_block}\n\n\
         Provide 3 alternative clause recommendations in JSON format:\n\
         {{\n\
         \x20 \"recommendations\": [\n\
         \x20   {{\n\
         \x20     \"priority\": 1,\n\
         \x20     \"proposed_text\": \"Full alternative clause text here\",\n\
         \x20     \"rationale\": \"Why this is better\",\n\
         \x20     \"risk_reduction\": \"Expected risk score after change (0-10)\",\n\
         \x20     \"likelihood_accepted\": \"HIGH\"\n\
         \x20   }}\n\
         \x20 ]\n\
         }}\n\n\
         Make recommendations progressively:\n\
         1. Ideal/aggressive position (might face pushback)\n\
         2. Moderate position (balanced)\n\
         3. Minimal acceptable position (compromise)",
        clause_type = clause.clause_type.as_str(),
        text = clause.text,
        risk_score = clause.risk_score.unwrap_or(0.0),
        concerns = clause.concerns.join(", "),
        industry = ctx.industry,
        company_size = ctx.company_size,
        risk_tolerance = ctx.risk_tolerance,
    )
}

/// Three-round negotiation strategy prompt, with prior rounds formatted
/// chronologically when re-planning.
pub fn negotiation_strategy(
    report: &RiskReport,
    priorities: &UserPriorities,
    history: &[NegotiationRound],
) -> String {
    let high: Vec<&Clause> = report.high_risk().collect();
    let high_block = high
        .iter()
        .map(|c| {
            format!(
                "- {}: {} (impact: {})",
                c.clause_type.as_str(),
                c.concerns.join(", "),
                c.impact.as_deref().unwrap_or("unknown")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let history_block = if history.is_empty() {
        String::new()
    } else {
        let mut block = String::from("\n\nPREVIOUS NEGOTIATION ROUNDS:\n");
        for round in history {
            let requested: Vec<String> = round
                .requests
                .iter()
                .map(|r| format!("{} ({})", r.clause_type.as_str(), r.proposed_text))
                .collect();
            block.push_str(&format!(
                "\nRound {}:\n- Requested: {}\n- Outcome: {} accepted, {} rejected, {} countered\n",
                round.round_number,
                requested.join("; "),
                round.accepted.len(),
                round.rejected.len(),
                round.countered.len(),
            ));
        }
        block
    };

    format!(
        "You are an expert negotiation strategist. Plan a multi-round negotiation for \
         this business contract.\n\n\
         CURRENT SITUATION:\n\
         Overall Risk Score: {overall}/10\n\
         High-Risk Issues: {high_count}\n\
         Medium-Risk Issues: {medium_count}\n\n\
         HIGH-RISK CLAUSES:\n{high_block}\n\n\
         USER PRIORITIES:\n\
         Must-Haves: {must_haves:?}\n\
         Nice-to-Haves: {nice_to_haves:?}{history_block}\n\n\
         Create a 3-round negotiation strategy in JSON format:\n\
         {{\n\
         \x20 \"round_1\": {{\n\
         \x20   \"objective\": \"Get quick wins on high-impact items\",\n\
         \x20   \"priority_requests\": [\n\
         \x20     {{\n\
         \x20       \"clause_type\": \"LIABILITY\",\n\
         \x20       \"current_issue\": \"Unlimited liability\",\n\
         \x20       \"request\": \"Cap at 12 months of fees\",\n\
         \x20       \"rationale\": \"Industry standard, high acceptance likelihood\",\n\
         \x20       \"acceptance_likelihood\": 85\n\
         \x20     }}\n\
         \x20   ],\n\
         \x20   \"talking_points\": [\"Point 1\", \"Point 2\"],\n\
         \x20   \"expected_outcome\": \"Likely to accept 2-3 out of 4 requests\"\n\
         \x20 }},\n\
         \x20 \"round_2\": {{\n\
         \x20   \"objective\": \"Address remaining concerns with compromises\",\n\
         \x20   \"conditional_on\": \"Partial acceptance in Round 1\",\n\
         \x20   \"requests\": [],\n\
         \x20   \"compromise_positions\": [\"If they reject X, offer Y\"]\n\
         \x20 }},\n\
         \x20 \"round_3\": {{\n\
         \x20   \"objective\": \"Final positions and walk-away conditions\",\n\
         \x20   \"requests\": [],\n\
         \x20   \"walk_away_triggers\": [\"No liability cap\"]\n\
         \x20 }},\n\
         \x20 \"overall_strategy\": \"...\",\n\
         \x20 \"estimated_timeline\": \"2-3 weeks\",\n\
         \x20 \"success_probability\": 75\n\
         }}\n\n\
         Strategy principles:\n\
         1. Lead with high-impact, likely-to-succeed requests\n\
         2. Save compromises for later rounds\n\
         3. Maintain deal momentum\n\
         4. Know when to walk away",
        overall = report.overall_score,
        high_count = high.len(),
        medium_count = report.medium_risk().count(),
        must_haves = priorities.must_haves,
        nice_to_haves = priorities.nice_to_haves,
    )
}

/// Classification prompt for a counterparty response against the round's
/// outstanding requests.
pub fn response_classification(requests: &[NegotiationRequest], response_text: &str) -> String {
    let request_block = requests
        .iter()
        .map(|r| {
            format!(
                "- {} ({}): {}",
                r.id,
                r.clause_type.as_str(),
                r.proposed_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze the counterparty's response to our negotiation.\n\n\
         Our Original Requests:\n{request_block}\n\n\
         Their Response:\n{response_text}\n\n\
         Determine which requests were accepted, rejected, or countered.\n\n\
         Format as JSON:\n\
         {{\n\
         \x20 \"accepted_requests\": [\"req-id-1\"],\n\
         \x20 \"rejected_requests\": [\"req-id-2\"],\n\
         \x20 \"counter_offers\": [\n\
         \x20   {{\"request_id\": \"req-id-3\", \"their_counter\": \"...\"}}\n\
         \x20 ],\n\
         \x20 \"sentiment\": \"positive\"\n\
         }}"
    )
}

/// Outbound negotiation message prompt. At most five requests are included.
pub fn outbound_message(
    overall_approach: &str,
    requests: &[NegotiationRequest],
    tone: &str,
) -> String {
    let request_block = requests
        .iter()
        .take(5)
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. {}:\n   Current: {}\n   Proposed: {}\n   Rationale: {}",
                i + 1,
                r.clause_type.as_str(),
                r.original_text,
                r.proposed_text,
                r.rationale
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Draft a professional business negotiation message.\n\n\
         TONE: {tone}\n\n\
         NEGOTIATION STRATEGY CONTEXT:\n{overall_approach}\n\n\
         SPECIFIC REQUESTS:\n{request_block}\n\n\
         Message requirements:\n\
         - Professional subject line\n\
         - Friendly opening\n\
         - Specific requested changes with brief rationale\n\
         - Emphasize mutual benefit\n\
         - Invitation to discuss\n\
         - Keep under 300 words\n\n\
         Return JSON format:\n\
         {{\n\
         \x20 \"subject\": \"Subject line here\",\n\
         \x20 \"body\": \"Full message body here\",\n\
         \x20 \"key_points\": [\"Point 1\", \"Point 2\"],\n\
         \x20 \"tone_check\": \"collaborative\"\n\
         }}"
    )
}
