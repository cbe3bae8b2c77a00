//! Clause segmentation and contract-structure extraction.
//!
//! Pure text transforms: a numbered-heading pattern splits the contract
//! into candidate sections, keyword tables tag sections with clause types,
//! and a handful of regexes pull out parties, dates, and term length. The
//! matching is deliberately low-precision/high-recall: a section that
//! mentions several clause-type vocabularies is emitted once per matching
//! type, duplicates included. Nothing here fails on malformed input:
//! absent matches produce empty lists or sentinel values.

use std::sync::LazyLock;

use chrono::Utc;
use pactum_core::{Clause, ClauseType, ContractKind, ParsedContract};
use regex::Regex;

/// Sentinel for dates and terms no pattern matched.
pub const NOT_SPECIFIED: &str = "Not specified";

const PREVIEW_CHARS: usize = 500;
const MAX_PARTIES: usize = 10;

/// A new section begins at a line starting with an integer, an optional
/// period, and a capitalised word.
static SECTION_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\d+\.?\s+[A-Z]").expect("valid regex"));

static PARTY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"between\s+([A-Z][A-Za-z\s,\.]+?)\s+(?:and|&)",
        r"party:\s*([A-Z][A-Za-z\s,\.]+?)(?:\n|$)",
        r"(?:entered into by|by and between)\s+([A-Z][A-Za-z\s,\.]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)effective\s+(?:date|as of)\s+(\w+\s+\d{1,2},?\s+\d{4})",
        r"(?i)dated\s+as of\s+(\w+\s+\d{1,2},?\s+\d{4})",
        r"(?i)entered into\s+(?:on|this)\s+(\w+\s+\d{1,2},?\s+\d{4})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static TERM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)term\s+of\s+(\d+\s+(?:year|month|day)s?)",
        r"(?i)for\s+a\s+period\s+of\s+(\d+\s+(?:year|month|day)s?)",
        r"(?i)shall\s+remain\s+in\s+effect\s+for\s+(\d+\s+(?:year|month|day)s?)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Keyword vocabulary per clause type. Order matters: clauses are emitted
/// in table order within each section.
const CLAUSE_KEYWORDS: &[(ClauseType, &[&str])] = &[
    (
        ClauseType::Liability,
        &["liability", "indemnif", "damages", "limitation of liability"],
    ),
    (
        ClauseType::Ip,
        &["intellectual property", "ip rights", "ownership", "proprietary"],
    ),
    (
        ClauseType::Payment,
        &["payment", "fees", "compensation", "invoice"],
    ),
    (
        ClauseType::Termination,
        &["termination", "cancellation", "end of agreement"],
    ),
    (
        ClauseType::Confidentiality,
        &["confidential", "proprietary information", "non-disclosure"],
    ),
    (
        ClauseType::DataProtection,
        &["data protection", "privacy", "gdpr", "personal data"],
    ),
    (
        ClauseType::DisputeResolution,
        &["dispute", "arbitration", "governing law", "jurisdiction"],
    ),
    (
        ClauseType::Warranty,
        &["warrant", "representation", "guarantee"],
    ),
];

/// Contract-kind keyword table, first match wins.
const KIND_KEYWORDS: &[(ContractKind, &[&str])] = &[
    (
        ContractKind::Nda,
        &["non-disclosure", "nondisclosure", "confidentiality agreement"],
    ),
    (ContractKind::Msa, &["master service agreement", "msa"]),
    (
        ContractKind::Saas,
        &["software as a service", "saas", "subscription agreement"],
    ),
    (
        ContractKind::Employment,
        &["employment agreement", "offer letter", "employment contract"],
    ),
    (
        ContractKind::Sow,
        &["statement of work", "sow", "work order"],
    ),
    (
        ContractKind::Consulting,
        &["consulting agreement", "consultant agreement"],
    ),
    (
        ContractKind::Vendor,
        &["vendor agreement", "purchase agreement"],
    ),
];

/// Split contract text into typed clauses.
///
/// A section matching several clause-type vocabularies yields one `Clause`
/// per matching type, each carrying the same underlying text.
pub fn segment(full_text: &str) -> Vec<Clause> {
    let mut clauses = Vec::new();
    for (index, section) in split_sections(full_text).iter().enumerate() {
        let lowered = section.to_lowercase();
        for &(clause_type, keywords) in CLAUSE_KEYWORDS {
            if keywords.iter().any(|k| lowered.contains(k)) {
                clauses.push(Clause {
                    id: format!("{}_{}", clause_type.as_str().to_lowercase(), index),
                    clause_type,
                    section: index,
                    text: preview(section),
                    full_text: section.clone(),
                    risk_score: None,
                    risk_level: None,
                    concerns: Vec::new(),
                    impact: None,
                    alternatives: Vec::new(),
                });
            }
        }
    }
    clauses
}

/// Classify the contract kind from its text.
pub fn classify_kind(full_text: &str) -> ContractKind {
    let lowered = full_text.to_lowercase();
    for &(kind, keywords) in KIND_KEYWORDS {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return kind;
        }
    }
    ContractKind::Other
}

/// Extract contracting party names. Deduplicated in first-seen order,
/// capped at [`MAX_PARTIES`] to bound regex noise.
pub fn extract_parties(full_text: &str) -> Vec<String> {
    let mut parties: Vec<String> = Vec::new();
    for pattern in PARTY_PATTERNS.iter() {
        for captures in pattern.captures_iter(full_text) {
            if let Some(m) = captures.get(1) {
                let name = m.as_str().trim().to_string();
                if name.len() > 3 && !parties.contains(&name) {
                    parties.push(name);
                }
            }
        }
    }
    parties.truncate(MAX_PARTIES);
    parties
}

/// Best-effort effective-date extraction; [`NOT_SPECIFIED`] on miss.
pub fn extract_effective_date(full_text: &str) -> String {
    first_capture(&DATE_PATTERNS, full_text)
}

/// Best-effort term-length extraction; [`NOT_SPECIFIED`] on miss.
pub fn extract_term_length(full_text: &str) -> String {
    first_capture(&TERM_PATTERNS, full_text)
}

/// Run the full structure extraction over one contract text.
pub fn parse_contract(full_text: &str) -> ParsedContract {
    let word_count = full_text.split_whitespace().count();
    ParsedContract {
        kind: classify_kind(full_text),
        parties: extract_parties(full_text),
        effective_date: extract_effective_date(full_text),
        term_length: extract_term_length(full_text),
        clauses: segment(full_text),
        word_count,
        estimated_pages: word_count / 250,
        parsed_at: Utc::now(),
    }
}

fn split_sections(text: &str) -> Vec<String> {
    let starts: Vec<usize> = SECTION_HEADING.find_iter(text).map(|m| m.start()).collect();
    let mut sections = Vec::with_capacity(starts.len() + 1);
    let mut prev = 0;
    for &start in &starts {
        sections.push(text[prev..start].trim().to_string());
        prev = start;
    }
    sections.push(text[prev..].trim().to_string());
    sections
}

fn preview(section: &str) -> String {
    section.chars().take(PREVIEW_CHARS).collect()
}

fn first_capture(patterns: &[Regex], text: &str) -> String {
    for pattern in patterns {
        if let Some(captures) = pattern.captures(text)
            && let Some(m) = captures.get(1)
        {
            return m.as_str().to_string();
        }
    }
    NOT_SPECIFIED.to_string()
}
