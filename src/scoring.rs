//! Coverage Scoring & Grading Engine
//!
//! Converts coverage records into numeric scores, percentages, and letter
//! grades. Per-policy scoring excludes controls that never matched any
//! document text (label `none` with the exact sentinel justification);
//! per-framework and overall pooling deliberately do NOT apply that
//! exclusion — downstream consumers rely on both semantics independently,
//! so the asymmetry is preserved on purpose. Summaries are recomputed from
//! scratch on every call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classify::Coverage;
use crate::report::CoverageRecord;

/// Sentinel justification marking a control that was never matched to any
/// document text. Shared by the pipeline (which writes it) and the scorer
/// (which excludes on it) so the two cannot drift.
pub const NO_RELEVANT_CONTENT: &str = "No relevant content found.";

/// Per-policy or per-framework aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: f64,
    pub total: usize,
    pub percentage: f64,
    pub grade: String,
}

/// Letter grade for a percentage; inclusive lower bounds.
pub fn grade(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "A+"
    } else if percentage >= 80.0 {
        "A"
    } else if percentage >= 70.0 {
        "B"
    } else if percentage >= 60.0 {
        "C"
    } else if percentage >= 50.0 {
        "D"
    } else {
        "F"
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn summarize(score: f64, total: usize) -> ScoreSummary {
    // Zero evaluable controls means vacuously compliant, not a
    // division-by-zero error.
    let percentage = if total > 0 {
        round2(score / total as f64 * 100.0)
    } else {
        100.0
    };
    ScoreSummary {
        score,
        total,
        percentage,
        grade: grade(percentage).to_string(),
    }
}

fn is_excluded(record: &CoverageRecord) -> bool {
    record.coverage == Coverage::None && record.justification == NO_RELEVANT_CONTENT
}

/// Score one policy's records, excluding never-matched sentinel records.
pub fn score_policy(records: &[CoverageRecord]) -> ScoreSummary {
    let relevant: Vec<&CoverageRecord> = records.iter().filter(|r| !is_excluded(r)).collect();
    let score: f64 = relevant.iter().map(|r| r.coverage.weight()).sum();
    summarize(score, relevant.len())
}

/// Pool records per framework, across however many policies produced them.
/// Every record counts at its label weight; no relevance exclusion here.
pub fn score_frameworks(records: &[CoverageRecord]) -> BTreeMap<String, ScoreSummary> {
    let mut pools: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for record in records {
        let pool = pools.entry(record.framework.clone()).or_insert((0.0, 0));
        pool.0 += record.coverage.weight();
        pool.1 += 1;
    }
    pools
        .into_iter()
        .map(|(framework, (score, total))| (framework, summarize(score, total)))
        .collect()
}

/// Pool every record into one overall summary; no relevance exclusion.
pub fn score_overall(records: &[CoverageRecord]) -> ScoreSummary {
    let score: f64 = records.iter().map(|r| r.coverage.weight()).sum();
    summarize(score, records.len())
}
