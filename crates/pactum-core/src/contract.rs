//! Contract-side data model: clauses, parsed structure, risk reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categorical tag assigned to a contract section by the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClauseType {
    Liability,
    Ip,
    Payment,
    Termination,
    Confidentiality,
    DataProtection,
    DisputeResolution,
    Warranty,
    Indemnification,
    #[serde(other)]
    Other,
}

impl ClauseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Liability => "LIABILITY",
            Self::Ip => "IP",
            Self::Payment => "PAYMENT",
            Self::Termination => "TERMINATION",
            Self::Confidentiality => "CONFIDENTIALITY",
            Self::DataProtection => "DATA_PROTECTION",
            Self::DisputeResolution => "DISPUTE_RESOLUTION",
            Self::Warranty => "WARRANTY",
            Self::Indemnification => "INDEMNIFICATION",
            Self::Other => "OTHER",
        }
    }
}

/// Categorical severity derived from a numeric risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    /// Band a contract-level aggregate score.
    ///
    /// These bands (3/5/7) are deliberately different from the per-clause
    /// severity bands the analysis prompt describes (4/7): the aggregate is
    /// a weighted mean and skews lower than its worst member.
    pub fn from_overall_score(score: f64) -> Self {
        if score < 3.0 {
            Self::Low
        } else if score < 5.0 {
            Self::Medium
        } else if score < 7.0 {
            Self::High
        } else {
            Self::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// How likely a counterparty is to accept a proposed alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

/// An alternative clause wording proposed by the recommendation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    /// 1 = aggressive, 2 = moderate, 3 = compromise.
    pub priority: u8,
    pub proposed_text: String,
    pub rationale: String,
    /// Expected risk score after the change, as reported by the model
    /// ("3", "Unknown", ...). Kept as text because the model is not reliable
    /// enough here to warrant a numeric field.
    #[serde(default)]
    pub risk_reduction: String,
    #[serde(default = "Likelihood::unknown")]
    pub likelihood_accepted: Likelihood,
}

impl Likelihood {
    fn unknown() -> Self {
        Self::Unknown
    }
}

/// A single contract clause, as emitted by the segmenter and enriched by
/// the risk scorer and recommendation engine.
///
/// Clauses are never mutated in place once stored: re-analysis produces a
/// fresh set attached to a new [`RiskReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
    /// `<type>_<section>`, e.g. `liability_3`.
    pub id: String,
    pub clause_type: ClauseType,
    /// Index of the source section within the contract.
    pub section: usize,
    /// First 500 characters of the section, used in prompts and summaries.
    pub text: String,
    pub full_text: String,
    /// 0–10, set by the risk scorer.
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

/// Contract category derived from a fixed keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractKind {
    #[serde(rename = "NDA")]
    Nda,
    #[serde(rename = "MSA")]
    Msa,
    #[serde(rename = "SaaS")]
    Saas,
    Employment,
    #[serde(rename = "SOW")]
    Sow,
    Consulting,
    Vendor,
    #[serde(rename = "OTHER")]
    #[serde(other)]
    Other,
}

impl ContractKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nda => "NDA",
            Self::Msa => "MSA",
            Self::Saas => "SaaS",
            Self::Employment => "Employment",
            Self::Sow => "SOW",
            Self::Consulting => "Consulting",
            Self::Vendor => "Vendor",
            Self::Other => "OTHER",
        }
    }
}

/// Structured output of the segmenter over one contract text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedContract {
    pub kind: ContractKind,
    /// Deduplicated party names, capped at 10.
    pub parties: Vec<String>,
    /// "Not specified" when no date pattern matched.
    pub effective_date: String,
    /// "Not specified" when no term pattern matched.
    pub term_length: String,
    pub clauses: Vec<Clause>,
    pub word_count: usize,
    pub estimated_pages: usize,
    pub parsed_at: DateTime<Utc>,
}

/// Business context the uploading user supplies for analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub industry: String,
    pub company_size: String,
    pub risk_tolerance: String,
}

impl Default for UserContext {
    fn default() -> Self {
        Self {
            industry: "General".into(),
            company_size: "Small".into(),
            risk_tolerance: "Moderate".into(),
        }
    }
}

/// Risk report for one contract version.
///
/// Reports are append-only history: re-analysing a contract creates a new
/// report rather than mutating an old one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub contract_id: String,
    /// Scored clauses, in segmenter order.
    pub clauses: Vec<Clause>,
    /// Severity-weighted mean of clause scores, rounded to one decimal.
    pub overall_score: f64,
    pub overall_level: RiskLevel,
    pub summary: String,
    pub analyzed_at: DateTime<Utc>,
}

impl RiskReport {
    /// Clauses scoring 7 or above.
    pub fn high_risk(&self) -> impl Iterator<Item = &Clause> {
        self.clauses
            .iter()
            .filter(|c| c.risk_score.unwrap_or(0.0) >= 7.0)
    }

    /// Clauses scoring in [4, 7).
    pub fn medium_risk(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(|c| {
            let s = c.risk_score.unwrap_or(0.0);
            (4.0..7.0).contains(&s)
        })
    }

    /// Clauses scoring below 4 (including unscored clauses).
    pub fn low_risk(&self) -> impl Iterator<Item = &Clause> {
        self.clauses
            .iter()
            .filter(|c| c.risk_score.unwrap_or(0.0) < 4.0)
    }
}

/// Lifecycle status of a contract record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Pending,
    Analyzing,
    Reviewed,
    NeedsNegotiation,
    Negotiating,
    Approved,
    Rejected,
    Error,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Analyzing => "ANALYZING",
            Self::Reviewed => "REVIEWED",
            Self::NeedsNegotiation => "NEEDS_NEGOTIATION",
            Self::Negotiating => "NEGOTIATING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Error => "ERROR",
        }
    }
}

/// A stored contract: document text, parsed structure, and analysis history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    pub contract_id: String,
    pub user_id: String,
    pub status: ContractStatus,
    pub user_context: UserContext,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub parsed: Option<ParsedContract>,
    /// Append-only: one entry per analysis run, newest last.
    #[serde(default)]
    pub reports: Vec<RiskReport>,
    #[serde(default)]
    pub negotiation_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContractRecord {
    pub fn new(contract_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            contract_id: contract_id.into(),
            user_id: user_id.into(),
            status: ContractStatus::Pending,
            user_context: UserContext::default(),
            full_text: None,
            parsed: None,
            reports: Vec::new(),
            negotiation_session_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The most recent risk report, if the contract has been analysed.
    pub fn latest_report(&self) -> Option<&RiskReport> {
        self.reports.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str, score: f64) -> Clause {
        Clause {
            id: id.into(),
            clause_type: ClauseType::Liability,
            section: 0,
            text: String::new(),
            full_text: String::new(),
            risk_score: Some(score),
            risk_level: None,
            concerns: vec![],
            impact: None,
            alternatives: vec![],
        }
    }

    #[test]
    fn overall_bands() {
        assert_eq!(RiskLevel::from_overall_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_overall_score(2.9), RiskLevel::Low);
        assert_eq!(RiskLevel::from_overall_score(3.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_overall_score(4.9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_overall_score(5.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_overall_score(6.9), RiskLevel::High);
        assert_eq!(RiskLevel::from_overall_score(7.0), RiskLevel::Critical);
    }

    #[test]
    fn buckets_partition_clauses() {
        let report = RiskReport {
            contract_id: "c1".into(),
            clauses: vec![
                scored("a", 9.0),
                scored("b", 7.0),
                scored("c", 6.9),
                scored("d", 4.0),
                scored("e", 3.9),
                scored("f", 0.0),
            ],
            overall_score: 0.0,
            overall_level: RiskLevel::Unknown,
            summary: String::new(),
            analyzed_at: Utc::now(),
        };

        let high = report.high_risk().count();
        let medium = report.medium_risk().count();
        let low = report.low_risk().count();
        assert_eq!(high, 2);
        assert_eq!(medium, 2);
        assert_eq!(low, 2);
        assert_eq!(high + medium + low, report.clauses.len());
    }

    #[test]
    fn unscored_clause_lands_in_low_bucket() {
        let mut clause = scored("a", 0.0);
        clause.risk_score = None;
        let report = RiskReport {
            contract_id: "c1".into(),
            clauses: vec![clause],
            overall_score: 0.0,
            overall_level: RiskLevel::Unknown,
            summary: String::new(),
            analyzed_at: Utc::now(),
        };
        assert_eq!(report.low_risk().count(), 1);
        assert_eq!(report.high_risk().count() + report.medium_risk().count(), 0);
    }

    #[test]
    fn clause_type_serialises_screaming_snake() {
        let json = serde_json::to_string(&ClauseType::DataProtection).unwrap();
        assert_eq!(json, "\"DATA_PROTECTION\"");
        let back: ClauseType = serde_json::from_str("\"IP\"").unwrap();
        assert_eq!(back, ClauseType::Ip);
    }

    #[test]
    fn unknown_clause_type_falls_back_to_other() {
        let parsed: ClauseType = serde_json::from_str("\"FORCE_MAJEURE\"").unwrap();
        assert_eq!(parsed, ClauseType::Other);
    }

    #[test]
    fn contract_kind_labels() {
        assert_eq!(ContractKind::Nda.as_str(), "NDA");
        assert_eq!(
            serde_json::to_string(&ContractKind::Saas).unwrap(),
            "\"SaaS\""
        );
    }
}
