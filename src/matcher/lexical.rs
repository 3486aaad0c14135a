//! Lexical Keyword-Overlap Matcher
//!
//! A cheap pre-filter over a whole control catalog: counts overlapping
//! normalized keywords between a document and each control's canonical
//! text. Intentionally permissive (low inclusive threshold) — its job is
//! to shrink the control set handed to the embedding matcher or the
//! external classifier, not to judge coverage. Every qualifying control
//! is reported together with its literal overlap set for auditability.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::catalog::Catalog;
use crate::text::keywords;

#[derive(Debug, Clone, Copy)]
pub struct LexicalConfig {
    /// Minimum overlapping keyword count (inclusive) for a candidate.
    pub min_overlap: usize,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self { min_overlap: 2 }
    }
}

/// A control whose keyword overlap with the document met the threshold.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateMatch {
    pub control_id: String,
    pub framework: String,
    pub title: String,
    /// The literal overlapping keywords, sorted.
    pub overlap: Vec<String>,
}

/// Overlap between two keyword sets.
pub fn overlap(doc: &BTreeSet<String>, control: &BTreeSet<String>) -> BTreeSet<String> {
    doc.intersection(control).cloned().collect()
}

/// Report every control whose keyword overlap with the document meets the
/// threshold, in catalog order.
pub fn candidate_controls(
    doc_text: &str,
    catalog: &Catalog,
    config: &LexicalConfig,
) -> Vec<CandidateMatch> {
    let doc_keywords = keywords(doc_text);
    let mut candidates = Vec::new();

    for control in catalog.controls() {
        let control_keywords = keywords(&format!("{} {}", control.title, control.text));
        let shared = overlap(&doc_keywords, &control_keywords);
        if shared.len() >= config.min_overlap {
            candidates.push(CandidateMatch {
                control_id: control.id.clone(),
                framework: control.framework.clone(),
                title: control.title.clone(),
                overlap: shared.into_iter().collect(),
            });
        }
    }

    debug!(
        "Lexical pre-filter: {} of {} controls are candidates",
        candidates.len(),
        catalog.len()
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_overlap_of_two_meets_inclusive_threshold() {
        let doc = set(&["access", "control", "policy"]);
        let ctrl = set(&["access", "control", "train"]);
        let shared = overlap(&doc, &ctrl);
        assert_eq!(shared, set(&["access", "control"]));
        assert!(shared.len() >= LexicalConfig::default().min_overlap);
    }

    #[test]
    fn test_overlap_of_one_is_below_threshold() {
        let doc = set(&["access", "policy"]);
        let ctrl = set(&["access", "train"]);
        let shared = overlap(&doc, &ctrl);
        assert_eq!(shared.len(), 1);
        assert!(shared.len() < LexicalConfig::default().min_overlap);
    }

    #[test]
    fn test_overlap_survives_inflection() {
        // "policies" and "policy" normalize to the same lemma
        let doc = keywords("Our security policies restrict access");
        let ctrl = keywords("An access policy must exist");
        let shared = overlap(&doc, &ctrl);
        assert!(shared.contains("policy"));
        assert!(shared.contains("access"));
    }
}
