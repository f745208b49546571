//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;

use super::types::storage::{IndexBackendType, PostgresConfig};
use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        // JSON5 is a superset of JSON and tolerates comments
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads `.env` if present, then overlays any `ATLAS_*` variables.
/// `DATABASE_URL` is honoured as well and switches the index to PostgreSQL.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    dotenvy::dotenv().ok();
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides read through `lookup`
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    // Memory overrides
    if let Some(collection) = lookup("ATLAS_MEMORY_COLLECTION") {
        config.memory.collection = collection;
    }
    if let Some(dims) = lookup("ATLAS_MEMORY_DIMENSIONS") {
        config.memory.dimensions = parse_number("ATLAS_MEMORY_DIMENSIONS", &dims)?;
    }
    if let Some(k) = lookup("ATLAS_MEMORY_DEFAULT_K") {
        config.memory.default_k = parse_number("ATLAS_MEMORY_DEFAULT_K", &k)?;
    }
    if let Some(age) = lookup("ATLAS_MAX_MEMORY_AGE") {
        config.memory.max_age = parse_duration("ATLAS_MAX_MEMORY_AGE", &age)?;
    }
    if let Some(interval) = lookup("ATLAS_SWEEP_INTERVAL") {
        config.memory.sweep_interval = parse_duration("ATLAS_SWEEP_INTERVAL", &interval)?;
    }
    if let Some(timeout) = lookup("ATLAS_EMBED_TIMEOUT") {
        config.memory.embed_timeout = parse_duration("ATLAS_EMBED_TIMEOUT", &timeout)?;
    }
    if let Some(timeout) = lookup("ATLAS_INDEX_TIMEOUT") {
        config.memory.index_timeout = parse_duration("ATLAS_INDEX_TIMEOUT", &timeout)?;
    }

    // Index overrides
    if let Some(url) = lookup("ATLAS_DATABASE_URL").or_else(|| lookup("DATABASE_URL")) {
        let pg = config
            .index
            .postgres
            .get_or_insert_with(|| PostgresConfig::new(String::new()));
        pg.url = SecretString::from(url);
        config.index.backend = IndexBackendType::Postgres;
    }
    if let Some(max_conn) = lookup("ATLAS_DATABASE_MAX_CONNECTIONS") {
        if let Some(ref mut pg) = config.index.postgres {
            pg.max_connections = parse_number("ATLAS_DATABASE_MAX_CONNECTIONS", &max_conn)?;
        }
    }
    if let Some(backend) = lookup("ATLAS_INDEX_BACKEND") {
        config.index.backend = backend.parse()?;
    }

    // Embedding overrides
    if let Some(backend) = lookup("ATLAS_EMBEDDING_BACKEND") {
        config.embedding.backend = backend.parse()?;
    }
    if let Some(model) = lookup("ATLAS_EMBEDDING_MODEL") {
        config.embedding.model = model;
    }
    if let Some(url) = lookup("ATLAS_EMBEDDING_URL") {
        config.embedding.base_url = url;
    }
    if let Some(key) = lookup("ATLAS_EMBEDDING_API_KEY") {
        config.embedding.api_key = Some(SecretString::from(key));
    }

    // Provider overrides
    if let Some(url) = lookup("ATLAS_LLM_BASE_URL") {
        config.provider.base_url = url;
    }
    if let Some(key) = lookup("ATLAS_LLM_API_KEY") {
        config.provider.api_key = Some(SecretString::from(key));
    }
    if let Some(model) = lookup("ATLAS_DEFAULT_MODEL") {
        config.provider.default_model = model;
    }
    if let Some(temperature) = lookup("ATLAS_MODEL_TEMPERATURE") {
        config.provider.temperature = parse_number("ATLAS_MODEL_TEMPERATURE", &temperature)?;
    }

    // Gateway overrides
    if let Some(host) = lookup("ATLAS_API_HOST") {
        config.gateway.bind = host;
    }
    if let Some(port) = lookup("ATLAS_API_PORT") {
        config.gateway.port = parse_number("ATLAS_API_PORT", &port)?;
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{}={:?} is not a valid number: {}", key, value, e)))
}

fn parse_duration(key: &str, value: &str) -> Result<Duration> {
    humantime_serde::re::humantime::parse_duration(value.trim())
        .map_err(|e| Error::Config(format!("{}={:?} is not a valid duration: {}", key, value, e)))
}

/// Save configuration to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::to_string_pretty(config).map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config)?
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}
