//! Matching Context
//!
//! Explicitly constructed shared state for a matching run: the embedding
//! provider handle plus the precomputed domain keyword-bag embeddings.
//! Built once at startup and passed by reference into each component,
//! replacing implicit process-wide caches. The domain embeddings are
//! write-once at construction and only read afterwards, so the context
//! is freely shareable across concurrent per-document and per-control
//! work.

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::domain::Domain;
use crate::embedding::{cosine_similarity, EmbeddingProvider};

pub struct MatchContext {
    embedder: Arc<dyn EmbeddingProvider>,
    domain_embeddings: Vec<(Domain, Vec<f32>)>,
}

impl MatchContext {
    /// Build a context, precomputing one embedding per domain keyword bag.
    pub async fn new(embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let bags: Vec<String> = Domain::ALL.iter().map(|d| d.keyword_bag()).collect();
        let vectors = embedder.embed(&bags).await?;
        let domain_embeddings = Domain::ALL.into_iter().zip(vectors).collect();
        debug!("Matching context initialized with {} domain embeddings", Domain::ALL.len());
        Ok(Self { embedder, domain_embeddings })
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Assign the single nearest domain to a control's canonical text.
    ///
    /// Nearest by cosine similarity against the precomputed keyword-bag
    /// embeddings; ties break toward the earlier domain in enumeration
    /// order. Intended to be called once per control at catalog load.
    pub async fn tag_control(&self, control_text: &str) -> Result<Domain> {
        let embedded = self.embedder.embed(&[control_text.to_string()]).await?;
        let control_emb = &embedded[0];

        let mut best = Domain::ALL[0];
        let mut best_score = f32::NEG_INFINITY;
        for (domain, emb) in &self.domain_embeddings {
            let score = cosine_similarity(control_emb, emb);
            if score > best_score {
                best = *domain;
                best_score = score;
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::test_util::MockEmbeddingProvider;

    #[tokio::test]
    async fn test_tag_control_picks_nearest_domain() -> Result<()> {
        let ctx = MatchContext::new(Arc::new(MockEmbeddingProvider::new())).await?;
        let tag = ctx
            .tag_control("Require authentication and authorization for every login")
            .await?;
        assert_eq!(tag, Domain::AccessControl);
        Ok(())
    }

    #[tokio::test]
    async fn test_tag_control_tie_breaks_by_enumeration_order() -> Result<()> {
        // A text with no overlap with any keyword bag scores 0.0 everywhere,
        // so the first domain in enumeration order wins.
        let ctx = MatchContext::new(Arc::new(MockEmbeddingProvider::new())).await?;
        let tag = ctx.tag_control("zzz qqq xxx").await?;
        assert_eq!(tag, Domain::AccessControl);
        Ok(())
    }
}
