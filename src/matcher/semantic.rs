//! Semantic Embedding Matcher
//!
//! Scores every (control-fragment, document-sentence) pair by cosine
//! similarity — a full cross product, acceptable because both counts are
//! small — then ranks, thresholds, deduplicates near-identical sentences
//! by lowercase prefix, and keeps the top k. Deduping globally at the
//! sentence level (rather than top-k per fragment) yields a more diverse
//! excerpt set when several fragments paraphrase the same idea.

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::context::MatchContext;
use crate::embedding::cosine_similarity;
use crate::text::Segmenter;

#[derive(Debug, Clone, Copy)]
pub struct MatcherConfig {
    /// Minimum cosine similarity for a sentence to qualify.
    pub threshold: f32,
    /// Maximum number of matches returned.
    pub top_k: usize,
    /// Document sentences at or under this length are discarded.
    pub min_sentence_len: usize,
    /// Control fragments at or under this length are discarded.
    pub min_fragment_len: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: 0.55,
            top_k: 3,
            min_sentence_len: 15,
            min_fragment_len: 20,
        }
    }
}

/// A document sentence matched against a control, with its similarity
/// score rounded to 3 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceMatch {
    pub sentence: String,
    pub score: f32,
}

/// Number of prefix characters compared when suppressing near-duplicate
/// sentences (boilerplate repeated across a document).
const DEDUP_PREFIX_CHARS: usize = 60;

pub struct SemanticMatcher {
    ctx: Arc<MatchContext>,
    config: MatcherConfig,
    segmenter: Segmenter,
}

impl SemanticMatcher {
    pub fn new(ctx: Arc<MatchContext>) -> Self {
        Self::with_config(ctx, MatcherConfig::default())
    }

    pub fn with_config(ctx: Arc<MatchContext>, config: MatcherConfig) -> Self {
        let segmenter = Segmenter::new(config.min_sentence_len);
        Self { ctx, config, segmenter }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Match a document against one control's canonical text.
    ///
    /// Returns up to `top_k` matches sorted by score descending, every
    /// score at or above the threshold, no two sharing a lowercase
    /// 60-character prefix. Empty when either side has no admissible
    /// text or nothing clears the threshold. Deterministic: identical
    /// inputs produce an identical ordered list.
    pub async fn match_control(
        &self,
        document_text: &str,
        control_text: &str,
    ) -> Result<Vec<SentenceMatch>> {
        let fragments: Vec<String> = control_text
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|f| f.chars().count() > self.config.min_fragment_len)
            .map(str::to_string)
            .collect();
        let sentences = self.segmenter.sentences(document_text);

        if fragments.is_empty() || sentences.is_empty() {
            return Ok(Vec::new());
        }

        let fragment_embs = self.ctx.embedder().embed(&fragments).await?;
        let sentence_embs = self.ctx.embedder().embed(&sentences).await?;

        // Cross product in fragment-major order; the index keeps the
        // enumeration order stable through the parallel map.
        let n = sentences.len();
        let mut scored: Vec<(usize, f32)> = (0..fragment_embs.len() * n)
            .into_par_iter()
            .map(|idx| {
                let (i, j) = (idx / n, idx % n);
                (idx, cosine_similarity(&fragment_embs[i], &sentence_embs[j]))
            })
            .collect();

        // Stable sort: ties keep enumeration order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut seen_prefixes: HashSet<String> = HashSet::new();
        let mut matches = Vec::new();
        for (idx, score) in scored {
            if score < self.config.threshold {
                break;
            }
            let sentence = &sentences[idx % n];
            let prefix: String = sentence
                .to_lowercase()
                .chars()
                .take(DEDUP_PREFIX_CHARS)
                .collect();
            if !seen_prefixes.insert(prefix) {
                continue;
            }
            matches.push(SentenceMatch {
                sentence: sentence.clone(),
                score: round3(score),
            });
            if matches.len() >= self.config.top_k {
                break;
            }
        }

        debug!(
            "Semantic match: {} fragments x {} sentences -> {} matches",
            fragments.len(),
            n,
            matches.len()
        );
        Ok(matches)
    }
}

/// Round to 3 decimal places for deterministic output across
/// floating-point implementations.
fn round3(x: f32) -> f32 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::test_util::MockEmbeddingProvider;

    async fn matcher() -> SemanticMatcher {
        let ctx = MatchContext::new(Arc::new(MockEmbeddingProvider::new()))
            .await
            .unwrap();
        SemanticMatcher::new(Arc::new(ctx))
    }

    const CONTROL: &str =
        "Require authentication and a password for every account login attempt by a user.";

    #[tokio::test]
    async fn test_matches_are_ranked_and_bounded() -> Result<()> {
        let m = matcher().await;
        let doc = "Every user must login with a password and authentication token. \
                   Office plants are watered on alternating weekday mornings. \
                   Authentication with a password is required for each account.";
        let matches = m.match_control(doc, CONTROL).await?;
        assert!(!matches.is_empty());
        assert!(matches.len() <= m.config().top_k);
        for w in matches.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
        for mt in &matches {
            assert!(mt.score >= m.config().threshold);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_determinism_across_runs() -> Result<()> {
        let m = matcher().await;
        let doc = "Every user must login with a password and authentication token. \
                   Authentication with a password is required for each account.";
        let first = m.match_control(doc, CONTROL).await?;
        let second = m.match_control(doc, CONTROL).await?;
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_dedup_suppresses_shared_prefixes() -> Result<()> {
        let m = matcher().await;
        // Two sentences identical for well over 60 chars
        let boiler = "All users must authenticate with a password before accessing any account";
        let doc = format!("{boiler} on the staging systems. {boiler} on the production systems.");
        let matches = m.match_control(&doc, CONTROL).await?;
        assert_eq!(matches.len(), 1);
        let mut prefixes = HashSet::new();
        for mt in &matches {
            let p: String = mt.sentence.to_lowercase().chars().take(60).collect();
            assert!(prefixes.insert(p));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_inputs_yield_empty() -> Result<()> {
        let m = matcher().await;
        assert!(m.match_control("", CONTROL).await?.is_empty());
        assert!(m
            .match_control("A policy document with enough length to pass.", "")
            .await?
            .is_empty());
        // All document sentences below the admission length
        assert!(m.match_control("Short. Tiny. No.", CONTROL).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_below_threshold_yields_empty() -> Result<()> {
        let m = matcher().await;
        let doc = "Office plants are watered on alternating weekday mornings by the janitor.";
        assert!(m.match_control(doc, CONTROL).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_scores_rounded_to_three_decimals() -> Result<()> {
        let m = matcher().await;
        let doc = "Every user must login with a password and authentication token today.";
        for mt in m.match_control(doc, CONTROL).await? {
            let scaled = mt.score * 1000.0;
            assert!((scaled - scaled.round()).abs() < 1e-3);
        }
        Ok(())
    }
}
