//! Embedder trait - Abstract interface for embedding providers

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into a fixed-width vector.
///
/// Identical text should produce vectors that are close under L2 distance;
/// bit-identical output is not required.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Provider identifier, for logs
    fn id(&self) -> &str;

    /// Width of every vector this embedder returns
    fn dimensions(&self) -> usize;

    /// Embed a single text. Failures are `Error::Embedding`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
