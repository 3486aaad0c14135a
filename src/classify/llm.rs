//! LLM-Backed Coverage Classifier
//!
//! Prompts a language model to judge control coverage from matched policy
//! excerpts. Every call goes through the token-bucket rate limiter and the
//! bounded retry policy; the call is issued exactly once per control per
//! audit. Malformed responses degrade to an `Unknown` judgment.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{
    extract_judgment, Coverage, CoverageClassifier, CoverageJudgment, LlmProvider, RateLimiter,
    RetryPolicy,
};
use crate::matcher::SentenceMatch;
use crate::scoring::NO_RELEVANT_CONTENT;

const DEFAULT_MODEL: &str = "llama3.1:8b";

pub struct LlmClassifier {
    provider: Arc<dyn LlmProvider>,
    model: String,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

impl LlmClassifier {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            model: DEFAULT_MODEL.to_string(),
            retry: RetryPolicy::default(),
            // 10 calls per minute against the external quota
            limiter: RateLimiter::new(10, Duration::from_secs(6)),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rate_limit(mut self, max_tokens: u32, refill_interval: Duration) -> Self {
        self.limiter = RateLimiter::new(max_tokens, refill_interval);
        self
    }

    fn prompt(control_text: &str, excerpts: &[SentenceMatch]) -> String {
        let excerpt_text = excerpts
            .iter()
            .map(|m| m.sentence.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"You are a cybersecurity auditor. Analyze whether the policy addresses the control.

CONTROL:
"""{control_text}"""

POLICY:
"""{excerpt_text}"""

Respond as JSON:
{{"coverage": "full | partial | none", "justification": "..."}}
"#
        )
    }
}

#[async_trait]
impl CoverageClassifier for LlmClassifier {
    async fn classify(
        &self,
        control_text: &str,
        excerpts: &[SentenceMatch],
    ) -> Result<CoverageJudgment> {
        // Absence of evidence is not a graded failure; no model call needed.
        if excerpts.is_empty() {
            return Ok(CoverageJudgment {
                coverage: Coverage::None,
                justification: NO_RELEVANT_CONTENT.to_string(),
            });
        }

        let prompt = Self::prompt(control_text, excerpts);
        debug!("Classifying control against {} excerpts", excerpts.len());

        // Each attempt, retries included, consumes a rate-limit token;
        // the quota is on calls reaching the provider, not on controls.
        let raw = self
            .retry
            .run(|| async {
                self.limiter.acquire().await;
                self.provider.generate(&self.model, prompt.clone(), None).await
            })
            .await?;

        Ok(extract_judgment(&raw))
    }
}
