//! Configuration module
//!
//! - types/mod.rs: Core configuration types (Config, GatewayConfig)
//! - types/provider.rs: Chat-completion provider configuration
//! - types/storage.rs: Memory, index and embedding configuration
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

pub use types::{Config, GatewayConfig};

pub use types::provider::ProviderConfig;

pub use types::storage::{
    EmbeddingBackendType, EmbeddingConfig, IndexBackendType, IndexConfig, MemoryConfig,
    PostgresConfig,
};

pub use io::{apply_env_overrides, apply_overrides_from, load_config, load_config_from_path, save_config};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
