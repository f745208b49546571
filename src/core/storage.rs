//! Storage traits - Abstract interface for the vector index
//!
//! `VectorIndex` is the seam between the memory store and whatever vector
//! database holds the records:
//! - PostgreSQL + pgvector for durable deployments
//! - An in-process index for local runs and tests
//!
//! Implementations own their concurrency safety. Inserts and searches may
//! interleave freely; a search is not required to observe an insert that is
//! still committing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Open mapping of string keys to JSON values attached to a memory
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A record ready to be written to the index
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemory {
    /// Raw stored utterance
    pub text: String,
    /// Embedding of `text`
    pub embedding: Vec<f32>,
    /// Write time, assigned by the memory store
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied context
    pub metadata: Metadata,
}

/// A search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMemory {
    /// Index-assigned record id
    pub id: i64,
    /// Stored text
    pub text: String,
    /// When the record was written
    pub timestamp: DateTime<Utc>,
    /// Stored metadata
    pub metadata: Metadata,
    /// Euclidean (L2) distance to the query; lower is more similar
    pub distance: f32,
}

/// Abstract interface for vector storage
///
/// Every method is a complete round trip. Implementations must release any
/// per-call resource (pooled connection, loaded collection) on every exit
/// path, including errors.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend identifier, for logs
    fn id(&self) -> &str;

    /// Create `collection` with `dimensions`-wide embeddings if it does not
    /// exist. An existing collection with a different width is an error.
    async fn ensure_collection(&self, collection: &str, dimensions: usize) -> Result<()>;

    /// Insert one record. Never modifies existing records.
    async fn insert(&self, collection: &str, memory: NewMemory) -> Result<()>;

    /// Up to `limit` nearest records by L2 distance, closest first, ties by
    /// ascending id. An empty collection yields an empty vector.
    async fn search(&self, collection: &str, query: &[f32], limit: usize)
        -> Result<Vec<ScoredMemory>>;

    /// Delete every record whose timestamp is strictly before `cutoff`.
    /// Returns the number of deleted records.
    async fn delete_older_than(&self, collection: &str, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Number of records in `collection`
    async fn count(&self, collection: &str) -> Result<u64>;
}

/// Euclidean distance between two equally sized vectors
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}
