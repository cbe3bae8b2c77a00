//! Tagged extraction of JSON from language-model output.
//!
//! Models are prompted to answer in JSON but routinely wrap it in prose or
//! markdown fences. Rather than best-effort scraping at every call site,
//! the outcome is modelled explicitly: either a parsed value or the raw
//! text, and each component decides its own documented fallback for the
//! `Unparsed` case.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Result of locating and parsing a JSON object in raw model output.
#[derive(Debug, Clone)]
pub enum ModelJson {
    Parsed(Value),
    Unparsed(String),
}

impl ModelJson {
    /// Locate a `{...}` span via greedy brace matching (first `{` to last
    /// `}`) and parse it. Anything else (no braces, reversed braces, or a
    /// span that is not valid JSON) yields `Unparsed` with the full raw
    /// text preserved for fallback construction.
    pub fn extract(raw: &str) -> Self {
        let span = match (raw.find('{'), raw.rfind('}')) {
            (Some(start), Some(end)) if start < end => &raw[start..=end],
            _ => {
                debug!("no JSON object span in model output");
                return Self::Unparsed(raw.to_string());
            }
        };
        match serde_json::from_str(span) {
            Ok(value) => Self::Parsed(value),
            Err(err) => {
                debug!(error = %err, "model output span is not valid JSON");
                Self::Unparsed(raw.to_string())
            }
        }
    }

    /// Deserialize the parsed value into a concrete type. A `Parsed` value
    /// whose shape does not match `T` degrades to `None`, the same as
    /// `Unparsed`; callers treat both as a parse failure.
    pub fn decode<T: DeserializeOwned>(self) -> Option<T> {
        match self {
            Self::Parsed(value) => match serde_json::from_value(value) {
                Ok(decoded) => Some(decoded),
                Err(err) => {
                    debug!(error = %err, "model JSON does not match expected shape");
                    None
                }
            },
            Self::Unparsed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Assessment {
        risk_score: f64,
        #[serde(default)]
        concerns: Vec<String>,
    }

    #[test]
    fn extracts_plain_object() {
        let out = ModelJson::extract(r#"{"risk_score": 8, "concerns": ["no cap"]}"#);
        let a: Assessment = out.decode().unwrap();
        assert_eq!(a.risk_score, 8.0);
        assert_eq!(a.concerns, vec!["no cap"]);
    }

    #[test]
    fn extracts_object_wrapped_in_prose() {
        let raw = "Here is my analysis:\n```json\n{\"risk_score\": 5}\n```\nLet me know.";
        let a: Assessment = ModelJson::extract(raw).decode().unwrap();
        assert_eq!(a.risk_score, 5.0);
    }

    #[test]
    fn greedy_span_covers_nested_objects() {
        let raw = r#"{"outer": {"risk_score": 1}, "risk_score": 3}"#;
        let a: Assessment = ModelJson::extract(raw).decode().unwrap();
        assert_eq!(a.risk_score, 3.0);
    }

    #[test]
    fn no_braces_is_unparsed() {
        match ModelJson::extract("I could not analyse this clause.") {
            ModelJson::Unparsed(text) => assert!(text.contains("could not")),
            ModelJson::Parsed(_) => panic!("expected Unparsed"),
        }
    }

    #[test]
    fn invalid_span_is_unparsed() {
        assert!(matches!(
            ModelJson::extract("{not json at all}"),
            ModelJson::Unparsed(_)
        ));
    }

    #[test]
    fn reversed_braces_are_unparsed() {
        assert!(matches!(
            ModelJson::extract("} oops {"),
            ModelJson::Unparsed(_)
        ));
    }

    #[test]
    fn shape_mismatch_decodes_to_none() {
        let out = ModelJson::extract(r#"{"risk_score": "not a number"}"#);
        assert!(out.decode::<Assessment>().is_none());
    }
}
