//! Embedding Module
//!
//! The embedding capability used by the semantic matcher and domain
//! tagger: an async provider trait returning fixed-dimension vectors,
//! plus cosine similarity over those vectors.

pub mod local;
#[doc(hidden)]
pub mod test_util;

pub use local::LocalEmbeddingProvider;

use anyhow::Result;
use async_trait::async_trait;

/// Capability trait for text embedding.
///
/// Implementations must be deterministic for identical input and return
/// vectors of consistent dimensionality across calls.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Cosine similarity between two vectors, in [-1, 1].
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
