//! Memory module - embedding, vector indexing, and the memory store
//!
//! Orchestrates embedding providers (fastembed, HTTP, placeholder), an
//! in-process embedding cache (moka), and the vector index (pgvector or
//! in-process) behind `MemoryStore`.

pub mod cache;
pub mod embedding;
pub mod index;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::CachedEmbedder;
pub use embedding::{build_embedder, FastEmbedder, HttpEmbedder, ZeroEmbedder};
pub use index::InMemoryIndex;
pub use store::{validate_collection_name, MemoryStore};

use std::sync::Arc;
use tracing::info;

use crate::config::{Config, IndexBackendType};
use crate::core::VectorIndex;
use crate::database::{init_pool, PgVectorIndex};
use crate::error::{Error, Result};

/// Build the vector index described by `config`
pub async fn build_index(config: &Config) -> Result<Arc<dyn VectorIndex>> {
    match config.index.backend {
        IndexBackendType::Memory => Ok(Arc::new(InMemoryIndex::new())),
        IndexBackendType::Postgres => {
            let pg = config.index.postgres.as_ref().ok_or_else(|| {
                Error::Config(
                    "PostgreSQL index selected but not configured. Set index.postgres or DATABASE_URL."
                        .into(),
                )
            })?;
            let pool = init_pool(pg).await?;
            Ok(Arc::new(PgVectorIndex::new(pool)))
        }
    }
}

/// Open the memory store described by `config` and make sure its
/// collection exists
pub async fn open(config: &Config) -> Result<MemoryStore> {
    let index = build_index(config).await?;
    let embedder = build_embedder(config)?;
    let store = MemoryStore::new(config.memory.clone(), index, embedder)?;
    store.init().await?;

    info!("Memory store ready");
    Ok(store)
}
