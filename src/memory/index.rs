//! In-process vector index
//!
//! Exact brute-force L2 search over a map of collections. Nothing is
//! persisted; this backs local runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::core::{l2_distance, NewMemory, ScoredMemory, VectorIndex};
use crate::error::{Error, Result};

#[derive(Debug)]
struct Collection {
    dimensions: usize,
    next_id: i64,
    records: BTreeMap<i64, NewMemory>,
}

impl Collection {
    fn new(dimensions: usize) -> Self {
        Collection {
            dimensions,
            next_id: 1,
            records: BTreeMap::new(),
        }
    }
}

/// Vector index held in process memory
#[derive(Clone, Default)]
pub struct InMemoryIndex {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(operation: &'static str, collection: &str) -> Error {
    Error::storage(operation, format!("collection '{}' does not exist", collection))
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn id(&self) -> &str {
        "memory"
    }

    async fn ensure_collection(&self, collection: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        match collections.get(collection) {
            Some(existing) if existing.dimensions != dimensions => Err(Error::storage(
                "ensure_collection",
                format!(
                    "schema mismatch: collection '{}' has {}-dim embeddings, expected {}",
                    collection, existing.dimensions, dimensions
                ),
            )),
            Some(_) => Ok(()),
            None => {
                debug!("Creating in-memory collection {} ({} dims)", collection, dimensions);
                collections.insert(collection.to_string(), Collection::new(dimensions));
                Ok(())
            }
        }
    }

    async fn insert(&self, collection: &str, memory: NewMemory) -> Result<()> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| missing("insert", collection))?;

        if memory.embedding.len() != target.dimensions {
            return Err(Error::storage(
                "insert",
                format!(
                    "embedding has {} dims, collection '{}' expects {}",
                    memory.embedding.len(),
                    collection,
                    target.dimensions
                ),
            ));
        }

        let id = target.next_id;
        target.next_id += 1;
        target.records.insert(id, memory);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredMemory>> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| missing("search", collection))?;

        if query.len() != target.dimensions {
            return Err(Error::storage(
                "search",
                format!(
                    "query has {} dims, collection '{}' expects {}",
                    query.len(),
                    collection,
                    target.dimensions
                ),
            ));
        }

        // BTreeMap iteration is ascending by id, and the sort is stable, so
        // equal distances keep id order.
        let mut scored: Vec<(i64, f32)> = target
            .records
            .iter()
            .map(|(id, record)| (*id, l2_distance(query, &record.embedding)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .filter_map(|(id, distance)| {
                target.records.get(&id).map(|record| ScoredMemory {
                    id,
                    text: record.text.clone(),
                    timestamp: record.timestamp,
                    metadata: record.metadata.clone(),
                    distance,
                })
            })
            .collect())
    }

    async fn delete_older_than(&self, collection: &str, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| missing("delete", collection))?;

        let before = target.records.len();
        target.records.retain(|_, record| record.timestamp >= cutoff);
        Ok((before - target.records.len()) as u64)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| missing("count", collection))?;
        Ok(target.records.len() as u64)
    }
}
