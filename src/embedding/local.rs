//! Local Embedding Provider
//!
//! Wraps fastembed's MiniLM model behind the `EmbeddingProvider` trait.
//! The model is initialized lazily and embeddings are memoized by content
//! hash, so repeated texts (document sentences scored against many
//! controls) are embedded exactly once.

use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::EmbeddingProvider;

pub struct LocalEmbeddingProvider {
    embedder: RwLock<Option<TextEmbedding>>,
    cache: RwLock<HashMap<String, Vec<f32>>>,
}

impl LocalEmbeddingProvider {
    pub fn new() -> Self {
        Self {
            embedder: RwLock::new(None),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn content_key(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn normalize(vec: &mut Vec<f32>) {
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vec {
                *x /= norm;
            }
        }
    }

    async fn embed_uncached(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut embedder_lock = self.embedder.write().await;
        if embedder_lock.is_none() {
            *embedder_lock = Some(
                TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
                    .context("Failed to initialize embedding model")?,
            );
        }
        let embedder = embedder_lock.as_mut().unwrap();
        let mut embeddings = embedder.embed(texts, None)?;
        for emb in &mut embeddings {
            Self::normalize(emb);
        }
        Ok(embeddings)
    }
}

impl Default for LocalEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let keys: Vec<String> = texts.iter().map(|t| Self::content_key(t)).collect();

        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut misses: Vec<usize> = Vec::new();
        {
            let cache = self.cache.read().await;
            for (i, key) in keys.iter().enumerate() {
                match cache.get(key) {
                    Some(v) => results[i] = Some(v.clone()),
                    None => misses.push(i),
                }
            }
        }

        if !misses.is_empty() {
            debug!("Embedding {} uncached texts ({} cached)", misses.len(), texts.len() - misses.len());
            let batch: Vec<String> = misses.iter().map(|&i| texts[i].clone()).collect();
            let embedded = self.embed_uncached(batch).await?;

            let mut cache = self.cache.write().await;
            for (&i, vec) in misses.iter().zip(embedded.into_iter()) {
                cache.insert(keys[i].clone(), vec.clone());
                results[i] = Some(vec);
            }
        }

        Ok(results.into_iter().map(|v| v.unwrap()).collect())
    }
}
