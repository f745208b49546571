//! Memory store - store, retrieve and expire textual memories
//!
//! The store embeds text, stamps it with the clock, and delegates
//! persistence and nearest-neighbour search to a `VectorIndex`. It keeps no
//! mutable state of its own: every operation is an independent round trip,
//! so clones can be used from any number of concurrent request handlers.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::MemoryConfig;
use crate::core::{Clock, Embedder, Metadata, NewMemory, ScoredMemory, SystemClock, VectorIndex};
use crate::error::{Error, Result};

/// Check that `name` is usable as a collection (and SQL table) name
pub fn validate_collection_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid_start && valid_rest && name.len() <= 63 {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "invalid collection name '{}': expected [a-z_][a-z0-9_]*, at most 63 characters",
            name
        )))
    }
}

/// Vector-indexed long-term memory
#[derive(Clone)]
pub struct MemoryStore {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    clock: Arc<dyn Clock>,
    config: Arc<MemoryConfig>,
}

impl MemoryStore {
    /// Create a memory store stamped by the system clock
    pub fn new(
        config: MemoryConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        Self::with_clock(config, index, embedder, Arc::new(SystemClock::new()))
    }

    /// Create a memory store with an explicit clock
    pub fn with_clock(
        config: MemoryConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        validate_collection_name(&config.collection).map_err(|e| Error::Config(e.to_string()))?;

        if config.dimensions == 0 {
            return Err(Error::Config("memory.dimensions must be at least 1".into()));
        }
        if config.default_k == 0 {
            return Err(Error::Config("memory.default_k must be at least 1".into()));
        }
        if embedder.dimensions() != config.dimensions {
            return Err(Error::Config(format!(
                "embedding provider '{}' produces {}-dim vectors but memory.dimensions is {}",
                embedder.id(),
                embedder.dimensions(),
                config.dimensions
            )));
        }

        Ok(MemoryStore {
            index,
            embedder,
            clock,
            config: Arc::new(config),
        })
    }

    /// Memory configuration in effect
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Create the collection if needed and check its embedding width
    pub async fn init(&self) -> Result<()> {
        self.index_call(
            "init",
            self.index
                .ensure_collection(&self.config.collection, self.config.dimensions),
        )
        .await?;

        info!(
            "Collection {} is ready on {} index ({} dims)",
            self.config.collection,
            self.index.id(),
            self.config.dimensions
        );
        Ok(())
    }

    /// Embed and persist `text` as a new memory
    ///
    /// On any error the memory must be treated as not stored.
    pub async fn store(&self, text: &str, metadata: Metadata) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::Validation("memory text must not be empty".into()));
        }

        let embedding = self.embed("store", text).await?;
        let memory = NewMemory {
            text: text.to_string(),
            embedding,
            timestamp: self.clock.now(),
            metadata,
        };

        self.index_call("store", self.index.insert(&self.config.collection, memory))
            .await?;

        debug!("Stored memory in collection {}", self.config.collection);
        Ok(())
    }

    /// Up to `k` memories nearest to `query`, most similar first
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredMemory>> {
        if query.trim().is_empty() {
            return Err(Error::Validation("query must not be empty".into()));
        }
        if k == 0 {
            return Err(Error::Validation("k must be at least 1".into()));
        }

        let embedding = self.embed("retrieve", query).await?;
        let memories = self
            .index_call(
                "retrieve",
                self.index.search(&self.config.collection, &embedding, k),
            )
            .await?;

        info!("Retrieved {} relevant memories", memories.len());
        Ok(memories)
    }

    /// `retrieve` with the configured default `k`
    pub async fn retrieve_default(&self, query: &str) -> Result<Vec<ScoredMemory>> {
        self.retrieve(query, self.config.default_k).await
    }

    /// Delete every memory strictly older than `max_age`
    ///
    /// Returns the number of deleted memories. Repeating the call without
    /// new writes deletes nothing further.
    pub async fn expire(&self, max_age: chrono::Duration) -> Result<u64> {
        if max_age < chrono::Duration::zero() {
            return Err(Error::Validation("max_age must not be negative".into()));
        }

        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let deleted = self
            .index_call(
                "expire",
                self.index.delete_older_than(&self.config.collection, cutoff),
            )
            .await?;

        info!(
            "Expired {} memories older than {} from {}",
            deleted, cutoff, self.config.collection
        );
        Ok(deleted)
    }

    /// `expire` with the configured default max age
    pub async fn expire_default(&self) -> Result<u64> {
        let max_age = chrono::Duration::from_std(self.config.max_age)
            .map_err(|e| Error::Config(format!("memory.max_age out of range: {}", e)))?;
        self.expire(max_age).await
    }

    /// Number of memories in the collection
    pub async fn count(&self) -> Result<u64> {
        self.index_call("count", self.index.count(&self.config.collection))
            .await
    }

    /// Embed under the embedding timeout and check the width
    async fn embed(&self, operation: &'static str, text: &str) -> Result<Vec<f32>> {
        let embedding = tokio::time::timeout(self.config.embed_timeout, self.embedder.embed(text))
            .await
            .map_err(|_| {
                Error::embedding(
                    operation,
                    format!("timed out after {:?}", self.config.embed_timeout),
                )
            })??;

        if embedding.len() != self.config.dimensions {
            return Err(Error::embedding(
                operation,
                format!(
                    "provider '{}' returned {} dims, expected {}",
                    self.embedder.id(),
                    embedding.len(),
                    self.config.dimensions
                ),
            ));
        }

        Ok(embedding)
    }

    /// Run an index call under the index timeout
    async fn index_call<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.config.index_timeout, call)
            .await
            .map_err(|_| {
                Error::storage(
                    operation,
                    format!("index timed out after {:?}", self.config.index_timeout),
                )
            })?
    }
}
