//! Audit Pipeline
//!
//! Orchestrates one policy audit: domain detection, per-control semantic
//! matching (optionally pre-filtered lexically), bounded-concurrency
//! coverage classification, and score aggregation into an `AuditReport`.
//! A failed classification call is contained to its own control — it
//! becomes an `unknown` record with the error text as justification and
//! the run continues.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::{Catalog, Control};
use crate::classify::{Coverage, CoverageClassifier, CoverageJudgment};
use crate::context::MatchContext;
use crate::domain::tag_document;
use crate::matcher::{candidate_controls, LexicalConfig, MatcherConfig, SemanticMatcher, SentenceMatch};
use crate::report::{AuditReport, ControlMapping, CoverageRecord};
use crate::scoring::{score_frameworks, score_policy, NO_RELEVANT_CONTENT};

#[derive(Debug, Clone, Copy)]
pub struct AuditConfig {
    pub matcher: MatcherConfig,
    pub lexical: LexicalConfig,
    /// When set, only controls passing the lexical pre-filter are matched
    /// semantically; the rest get sentinel records immediately.
    pub lexical_prefilter: bool,
    /// Concurrent in-flight classification calls.
    pub classify_concurrency: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            matcher: MatcherConfig::default(),
            lexical: LexicalConfig::default(),
            lexical_prefilter: false,
            classify_concurrency: 4,
        }
    }
}

pub struct Auditor {
    ctx: Arc<MatchContext>,
    classifier: Arc<dyn CoverageClassifier>,
    config: AuditConfig,
}

impl Auditor {
    pub fn new(ctx: Arc<MatchContext>, classifier: Arc<dyn CoverageClassifier>) -> Self {
        Self {
            ctx,
            classifier,
            config: AuditConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AuditConfig) -> Self {
        self.config = config;
        self
    }

    /// Audit one policy against a loaded catalog.
    pub async fn audit(
        &self,
        policy_name: &str,
        policy_text: &str,
        catalog: &Catalog,
    ) -> Result<AuditReport> {
        info!("Auditing '{}' against {} controls", policy_name, catalog.len());

        let detected_domains = tag_document(policy_text);
        let matcher = SemanticMatcher::with_config(self.ctx.clone(), self.config.matcher);

        let prefiltered: Option<HashSet<(String, String)>> = if self.config.lexical_prefilter {
            Some(
                candidate_controls(policy_text, catalog, &self.config.lexical)
                    .into_iter()
                    .map(|c| (c.framework, c.control_id))
                    .collect(),
            )
        } else {
            None
        };

        let mut mappings = Vec::new();
        let mut slots: Vec<Option<CoverageRecord>> = vec![None; catalog.len()];
        let mut pending: Vec<(usize, &Control, Vec<SentenceMatch>)> = Vec::new();

        for (idx, control) in catalog.controls().iter().enumerate() {
            let passes_prefilter = prefiltered
                .as_ref()
                .map(|set| set.contains(&(control.framework.clone(), control.id.clone())))
                .unwrap_or(true);

            let matches = if passes_prefilter {
                matcher.match_control(policy_text, &control.text).await?
            } else {
                Vec::new()
            };

            if matches.is_empty() {
                slots[idx] = Some(sentinel_record(control));
                continue;
            }

            mappings.push(ControlMapping {
                control_id: control.id.clone(),
                framework: control.framework.clone(),
                title: control.title.clone(),
                domain: control.domain,
                sentences: matches.iter().map(|m| m.sentence.clone()).collect(),
                scores: matches.iter().map(|m| m.score).collect(),
            });
            pending.push((idx, control, matches));
        }

        info!(
            "'{}': {} controls matched, {} unmatched",
            policy_name,
            pending.len(),
            catalog.len() - pending.len()
        );

        let classified: Vec<(usize, CoverageRecord)> = stream::iter(pending)
            .map(|(idx, control, matches)| {
                let classifier = self.classifier.clone();
                async move {
                    let judgment = match classifier.classify(&control.text, &matches).await {
                        Ok(judgment) => judgment,
                        Err(err) => {
                            warn!("Classification failed for {}::{}: {}", control.framework, control.id, err);
                            CoverageJudgment {
                                coverage: Coverage::Unknown,
                                justification: err.to_string(),
                            }
                        }
                    };
                    (
                        idx,
                        CoverageRecord {
                            control_id: control.id.clone(),
                            framework: control.framework.clone(),
                            coverage: judgment.coverage,
                            justification: judgment.justification,
                            domain: control.domain,
                        },
                    )
                }
            })
            .buffered(self.config.classify_concurrency.max(1))
            .collect()
            .await;

        for (idx, record) in classified {
            slots[idx] = Some(record);
        }
        let records: Vec<CoverageRecord> = slots
            .into_iter()
            .zip(catalog.controls())
            .map(|(slot, control)| slot.unwrap_or_else(|| sentinel_record(control)))
            .collect();

        let summary = score_policy(&records);
        let by_framework = score_frameworks(&records);
        let gaps = records.iter().filter(|r| r.is_gap()).cloned().collect();

        info!(
            "'{}': {:.1}/{} -> {}% ({})",
            policy_name, summary.score, summary.total, summary.percentage, summary.grade
        );

        Ok(AuditReport {
            run_id: Uuid::new_v4(),
            policy: policy_name.to_string(),
            generated_at: chrono::Utc::now(),
            detected_domains,
            mappings,
            records,
            gaps,
            summary,
            by_framework,
        })
    }
}

fn sentinel_record(control: &Control) -> CoverageRecord {
    CoverageRecord {
        control_id: control.id.clone(),
        framework: control.framework.clone(),
        coverage: Coverage::None,
        justification: NO_RELEVANT_CONTENT.to_string(),
        domain: control.domain,
    }
}
