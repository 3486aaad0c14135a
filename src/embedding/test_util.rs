//! Deterministic embedding provider for tests.
//!
//! Embeds text as a bag-of-words vector over a fixed security vocabulary:
//! identical texts get identical vectors, topically similar texts get high
//! cosine similarity, and texts with no vocabulary hits embed to the zero
//! vector (cosine 0 against everything). No model download, no I/O.

use anyhow::Result;
use async_trait::async_trait;

use super::EmbeddingProvider;
use crate::domain::Domain;

pub struct MockEmbeddingProvider {
    vocab: Vec<String>,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        let mut vocab: Vec<String> = Vec::new();
        for domain in Domain::ALL {
            for kw in domain.keywords() {
                for word in kw.split_whitespace() {
                    if !vocab.iter().any(|v| v == word) {
                        vocab.push(word.to_string());
                    }
                }
            }
        }
        for word in [
            "encrypt", "backup", "firewall", "mfa", "log", "monitor", "review", "server",
            "laptop", "data", "protect", "user", "account", "network", "quarterly", "report",
        ] {
            if !vocab.iter().any(|v| v == word) {
                vocab.push(word.to_string());
            }
        }
        Self { vocab }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphabetic())
            .filter(|t| !t.is_empty())
            .collect();
        let mut vec = vec![0.0f32; self.vocab.len()];
        for token in tokens {
            if let Some(idx) = self.vocab.iter().position(|v| v == token) {
                vec[idx] += 1.0;
            }
        }
        vec
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
