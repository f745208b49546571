//! Test doubles shared by the crate's unit tests

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::{Clock, Embedder, NewMemory, ScoredMemory, VectorIndex};
use crate::error::{Error, Result};

/// Bag-of-words embedder: each lowercase word bumps one hashed bucket.
/// Equal texts give equal vectors; texts sharing words land close together.
#[derive(Debug, Clone)]
pub struct WordHashEmbedder {
    dimensions: usize,
}

impl WordHashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        WordHashEmbedder { dimensions }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.dimensions];
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            v[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for WordHashEmbedder {
    fn id(&self) -> &str {
        "word-hash"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }
}

/// Word-hash embedder that counts calls and can be told to fail
#[derive(Debug)]
pub struct CountingEmbedder {
    inner: WordHashEmbedder,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl CountingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        CountingEmbedder {
            inner: WordHashEmbedder::new(dimensions),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    fn id(&self) -> &str {
        "counting"
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::embedding("embed", "provider unavailable"));
        }
        self.inner.embed(text).await
    }
}

/// Embedder that returns vectors of the wrong width
#[derive(Debug)]
pub struct MisshapenEmbedder {
    pub declared: usize,
    pub actual: usize,
}

#[async_trait]
impl Embedder for MisshapenEmbedder {
    fn id(&self) -> &str {
        "misshapen"
    }

    fn dimensions(&self) -> usize {
        self.declared
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0; self.actual])
    }
}

/// Embedder that never answers
#[derive(Debug)]
pub struct StallingEmbedder {
    pub dimensions: usize,
}

#[async_trait]
impl Embedder for StallingEmbedder {
    fn id(&self) -> &str {
        "stalling"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(vec![0.0; self.dimensions])
    }
}

/// Clock moved by hand
#[derive(Debug)]
pub struct ManualClock {
    micros: AtomicI64,
}

impl ManualClock {
    pub fn at(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(ManualClock {
            micros: AtomicI64::new(start.timestamp_micros()),
        })
    }

    pub fn advance(&self, by: Duration) {
        let delta = by.num_microseconds().unwrap_or(i64::MAX);
        self.micros.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.micros.load(Ordering::SeqCst))
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Index whose every call fails as if the database were down
#[derive(Debug, Default)]
pub struct UnreachableIndex;

#[async_trait]
impl VectorIndex for UnreachableIndex {
    fn id(&self) -> &str {
        "unreachable"
    }

    async fn ensure_collection(&self, _collection: &str, _dimensions: usize) -> Result<()> {
        Err(Error::storage("ensure_collection", "connection refused"))
    }

    async fn insert(&self, _collection: &str, _memory: NewMemory) -> Result<()> {
        Err(Error::storage("insert", "connection refused"))
    }

    async fn search(&self, _collection: &str, _query: &[f32], _limit: usize) -> Result<Vec<ScoredMemory>> {
        Err(Error::storage("search", "connection refused"))
    }

    async fn delete_older_than(&self, _collection: &str, _cutoff: DateTime<Utc>) -> Result<u64> {
        Err(Error::storage("delete", "connection refused"))
    }

    async fn count(&self, _collection: &str) -> Result<u64> {
        Err(Error::storage("count", "connection refused"))
    }
}

/// Index whose every call hangs
#[derive(Debug, Default)]
pub struct StallingIndex;

impl StallingIndex {
    async fn stall() {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
    }
}

#[async_trait]
impl VectorIndex for StallingIndex {
    fn id(&self) -> &str {
        "stalling"
    }

    async fn ensure_collection(&self, _collection: &str, _dimensions: usize) -> Result<()> {
        Self::stall().await;
        Ok(())
    }

    async fn insert(&self, _collection: &str, _memory: NewMemory) -> Result<()> {
        Self::stall().await;
        Ok(())
    }

    async fn search(&self, _collection: &str, _query: &[f32], _limit: usize) -> Result<Vec<ScoredMemory>> {
        Self::stall().await;
        Ok(Vec::new())
    }

    async fn delete_older_than(&self, _collection: &str, _cutoff: DateTime<Utc>) -> Result<u64> {
        Self::stall().await;
        Ok(0)
    }

    async fn count(&self, _collection: &str) -> Result<u64> {
        Self::stall().await;
        Ok(0)
    }
}
