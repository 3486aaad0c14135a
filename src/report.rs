//! Audit Report Model
//!
//! The structured per-policy output consumed by reporting and dashboard
//! collaborators: detected domains, matched controls with their excerpts
//! and scores, coverage records, gaps, and score summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::classify::Coverage;
use crate::domain::Domain;
use crate::scoring::{score_frameworks, score_overall, ScoreSummary};

/// One control's coverage judgment against one policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRecord {
    pub control_id: String,
    pub framework: String,
    pub coverage: Coverage,
    pub justification: String,
    pub domain: Domain,
}

impl CoverageRecord {
    /// A gap is any record whose label is not `full` — an unmet or
    /// partially met requirement.
    pub fn is_gap(&self) -> bool {
        self.coverage != Coverage::Full
    }
}

/// A control that matched the policy, with the excerpts handed to the
/// classifier and their similarity scores (parallel vectors).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMapping {
    pub control_id: String,
    pub framework: String,
    pub title: String,
    pub domain: Domain,
    pub sentences: Vec<String>,
    pub scores: Vec<f32>,
}

/// The full audit artifact for one policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub run_id: Uuid,
    pub policy: String,
    pub generated_at: DateTime<Utc>,
    pub detected_domains: Vec<Domain>,
    pub mappings: Vec<ControlMapping>,
    pub records: Vec<CoverageRecord>,
    pub gaps: Vec<CoverageRecord>,
    pub summary: ScoreSummary,
    pub by_framework: BTreeMap<String, ScoreSummary>,
}

/// Cross-policy aggregate for one batch run: framework pools spanning
/// every audited policy, plus one overall compliance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub generated_at: DateTime<Utc>,
    pub policies: Vec<String>,
    pub overall: ScoreSummary,
    pub by_framework: BTreeMap<String, ScoreSummary>,
}

impl BatchSummary {
    /// Pool the records of every audited policy. Unlike per-policy
    /// scoring, these pools count every record at its label weight,
    /// sentinel records included.
    pub fn from_records(policies: Vec<String>, records: &[CoverageRecord]) -> Self {
        Self {
            generated_at: Utc::now(),
            policies,
            overall: score_overall(records),
            by_framework: score_frameworks(records),
        }
    }
}
