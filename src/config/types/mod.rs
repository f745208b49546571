//! Configuration types module

pub mod provider;
pub mod storage;

use serde::{Deserialize, Serialize};

/// Main application configuration
///
/// Built once at process entry and handed to each component's constructor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Memory store configuration
    #[serde(default)]
    pub memory: storage::MemoryConfig,

    /// Vector index configuration
    #[serde(default)]
    pub index: storage::IndexConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: storage::EmbeddingConfig,

    /// Chat-completion provider configuration
    #[serde(default)]
    pub provider: provider::ProviderConfig,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from the config file and environment
    ///
    /// Layers, lowest precedence first:
    /// 1. Default values
    /// 2. Config file (if present)
    /// 3. Environment variable overrides
    pub fn from_env() -> crate::error::Result<Self> {
        crate::config::load_config()
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

fn default_port() -> u16 {
    8000
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
