//! Storage configuration types
//!
//! Configuration for the memory store, its vector index backend, and the
//! embedding provider that feeds it.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Memory store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Collection (table) holding the memories
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Embedding width; must match the embedding provider
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Results returned by a retrieval when the caller does not say
    #[serde(default = "default_k")]
    pub default_k: usize,
    /// Age past which the expiry sweep deletes a memory
    #[serde(default = "default_max_age", with = "humantime_serde")]
    pub max_age: Duration,
    /// Period of the background expiry sweep; zero disables it
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// Upper bound on a single embedding call
    #[serde(default = "default_embed_timeout", with = "humantime_serde")]
    pub embed_timeout: Duration,
    /// Upper bound on a single index call
    #[serde(default = "default_index_timeout", with = "humantime_serde")]
    pub index_timeout: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            collection: default_collection(),
            dimensions: default_dimensions(),
            default_k: default_k(),
            max_age: default_max_age(),
            sweep_interval: default_sweep_interval(),
            embed_timeout: default_embed_timeout(),
            index_timeout: default_index_timeout(),
        }
    }
}

fn default_collection() -> String {
    "atlas_memories".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_k() -> usize {
    5
}

fn default_max_age() -> Duration {
    Duration::from_secs(30 * 24 * 60 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_embed_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_index_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Vector index configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index backend
    #[serde(default)]
    pub backend: IndexBackendType,
    /// PostgreSQL configuration
    pub postgres: Option<PostgresConfig>,
}

/// Vector index backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackendType {
    /// In-process (no persistence)
    #[default]
    Memory,
    /// PostgreSQL with pgvector
    Postgres,
}

impl std::str::FromStr for IndexBackendType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(IndexBackendType::Memory),
            "postgres" | "pgvector" => Ok(IndexBackendType::Postgres),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid index backend: {}. Valid: memory, postgres",
                s
            ))),
        }
    }
}

/// PostgreSQL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Database URL
    #[serde(skip_serializing)]
    pub url: SecretString,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl PostgresConfig {
    /// Configuration for `url` with default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        PostgresConfig {
            url: SecretString::from(url.into()),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding backend
    #[serde(default)]
    pub backend: EmbeddingBackendType,
    /// Model name (fastembed model id, or remote model name)
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Base URL of an OpenAI-compatible embeddings API
    #[serde(default = "default_embedding_url")]
    pub base_url: String,
    /// API key for the remote embeddings API
    #[serde(skip_serializing, default)]
    pub api_key: Option<SecretString>,
    /// Cache embeddings in process
    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig {
            backend: EmbeddingBackendType::default(),
            model: default_embedding_model(),
            base_url: default_embedding_url(),
            api_key: None,
            cache: true,
        }
    }
}

/// Embedding backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackendType {
    /// Local model via fastembed
    #[default]
    Fastembed,
    /// OpenAI-compatible HTTP endpoint
    Http,
    /// All-zero vectors; similarity search degrades to insertion order
    Zero,
}

impl std::str::FromStr for EmbeddingBackendType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fastembed" | "local" => Ok(EmbeddingBackendType::Fastembed),
            "http" | "openai" | "remote" => Ok(EmbeddingBackendType::Http),
            "zero" | "placeholder" => Ok(EmbeddingBackendType::Zero),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid embedding backend: {}. Valid: fastembed, http, zero",
                s
            ))),
        }
    }
}

fn default_embedding_model() -> String {
    "multilingual-e5-small".to_string()
}

fn default_embedding_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_true() -> bool {
    true
}
