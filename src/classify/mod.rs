//! Coverage Classifier Boundary
//!
//! The external capability that judges how well matched policy excerpts
//! satisfy a control. The engine supplies (control text, excerpts) and
//! consumes a structured {coverage, justification} judgment; everything
//! about the judgment itself lives behind the `CoverageClassifier` trait.

pub mod llm;
pub mod provider;
pub mod retry;

pub use llm::LlmClassifier;
pub use provider::{LlmProvider, OllamaProvider, OpenAICompatibleProvider};
pub use retry::{RateLimiter, RetryPolicy};

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::OnceLock;

use crate::matcher::SentenceMatch;

/// Coverage judgment for one control against one policy.
///
/// Exactly four kinds; any value outside the set degrades to `Unknown`
/// rather than propagating arbitrary strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    Full,
    Partial,
    None,
    Unknown,
}

impl Coverage {
    /// Numeric weight used by the scoring engine.
    pub fn weight(self) -> f64 {
        match self {
            Coverage::Full => 1.0,
            Coverage::Partial => 0.5,
            Coverage::None | Coverage::Unknown => 0.0,
        }
    }

    /// Parse a classifier-supplied label, degrading out-of-set values.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "full" => Coverage::Full,
            "partial" => Coverage::Partial,
            "none" => Coverage::None,
            _ => Coverage::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for Coverage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Coverage::parse(&label))
    }
}

/// The structured output of a classification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageJudgment {
    pub coverage: Coverage,
    pub justification: String,
}

/// Capability trait for the external coverage judgment.
#[async_trait]
pub trait CoverageClassifier: Send + Sync {
    /// Judge how well the matched excerpts satisfy the control. Errors are
    /// contained by the caller; they never abort a whole audit run.
    async fn classify(
        &self,
        control_text: &str,
        excerpts: &[SentenceMatch],
    ) -> Result<CoverageJudgment>;
}

fn json_object_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").unwrap())
}

/// Extract a judgment from free-form classifier output.
///
/// Locates the first embedded JSON object (classifiers frequently wrap
/// the payload in prose or code fences) and parses it; on any failure
/// falls back to an `Unknown` judgment instead of raising.
pub fn extract_judgment(raw: &str) -> CoverageJudgment {
    let Some(m) = json_object_pattern().find(raw) else {
        return CoverageJudgment {
            coverage: Coverage::Unknown,
            justification: "No valid JSON returned".to_string(),
        };
    };
    match serde_json::from_str::<serde_json::Value>(m.as_str()) {
        Ok(value) => {
            let coverage = value
                .get("coverage")
                .and_then(|v| v.as_str())
                .map(Coverage::parse)
                .unwrap_or(Coverage::Unknown);
            let justification = value
                .get("justification")
                .and_then(|v| v.as_str())
                .unwrap_or("Invalid AI response format")
                .to_string();
            CoverageJudgment { coverage, justification }
        }
        Err(_) => CoverageJudgment {
            coverage: Coverage::Unknown,
            justification: "Invalid AI response format".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_match_scoring_table() {
        assert_eq!(Coverage::Full.weight(), 1.0);
        assert_eq!(Coverage::Partial.weight(), 0.5);
        assert_eq!(Coverage::None.weight(), 0.0);
        assert_eq!(Coverage::Unknown.weight(), 0.0);
    }

    #[test]
    fn test_parse_degrades_out_of_set_labels() {
        assert_eq!(Coverage::parse("FULL"), Coverage::Full);
        assert_eq!(Coverage::parse(" partial "), Coverage::Partial);
        assert_eq!(Coverage::parse("mostly"), Coverage::Unknown);
        assert_eq!(Coverage::parse(""), Coverage::Unknown);
    }

    #[test]
    fn test_extract_judgment_from_fenced_response() {
        let raw = "Here is my analysis:\n```json\n{\"coverage\": \"partial\", \
                   \"justification\": \"Only password rules are covered.\"}\n```";
        let j = extract_judgment(raw);
        assert_eq!(j.coverage, Coverage::Partial);
        assert_eq!(j.justification, "Only password rules are covered.");
    }

    #[test]
    fn test_extract_judgment_no_json_falls_back() {
        let j = extract_judgment("I think the policy is fine.");
        assert_eq!(j.coverage, Coverage::Unknown);
        assert_eq!(j.justification, "No valid JSON returned");
    }

    #[test]
    fn test_extract_judgment_malformed_json_falls_back() {
        let j = extract_judgment("{coverage: full,,,}");
        assert_eq!(j.coverage, Coverage::Unknown);
        assert_eq!(j.justification, "Invalid AI response format");
    }

    #[test]
    fn test_deserialize_degrades_unknown_coverage() {
        let j: CoverageJudgment =
            serde_json::from_str(r#"{"coverage": "perhaps", "justification": "x"}"#).unwrap();
        assert_eq!(j.coverage, Coverage::Unknown);
    }
}
