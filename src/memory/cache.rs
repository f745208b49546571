//! In-process embedding cache
//!
//! Uses moka async cache (Send + Sync, TTL-based eviction). Only embeddings
//! are cached; search results never are, so a retrieval always reflects the
//! index.

use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::core::Embedder;
use crate::error::Result;

/// Embedder wrapper that memoizes vectors by text
#[derive(Clone)]
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    /// text -> Vec<f32>
    embeddings: Cache<String, Vec<f32>>,
}

impl CachedEmbedder {
    /// Wrap `inner` with default settings (1000 entries, 30 min TTL)
    pub fn new(inner: Arc<dyn Embedder>) -> Self {
        Self::with_capacity(inner, 1000, Duration::from_secs(30 * 60))
    }

    /// Wrap `inner` with explicit capacity and TTL
    pub fn with_capacity(inner: Arc<dyn Embedder>, capacity: u64, ttl: Duration) -> Self {
        CachedEmbedder {
            inner,
            embeddings: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.embeddings.get(text).await {
            return Ok(cached);
        }

        // Failures are not cached
        let embedding = self.inner.embed(text).await?;
        self.embeddings
            .insert(text.to_string(), embedding.clone())
            .await;
        Ok(embedding)
    }
}
