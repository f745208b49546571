//! Configuration validation
//!
//! Validates configuration and reports issues.

use super::types::storage::{EmbeddingBackendType, IndexBackendType};
use super::types::Config;
use crate::memory::embedding::fastembed_dimensions;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_memory_config(config, result);
    result = validate_index_config(config, result);
    result = validate_embedding_config(config, result);
    result = validate_provider_config(config, result);

    result
}

fn validate_memory_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.memory.dimensions == 0 {
        result = result.with_error(ValidationIssue::new(
            "memory.dimensions",
            "Embedding dimensionality must be at least 1",
        ));
    }

    if config.memory.default_k == 0 {
        result = result.with_error(ValidationIssue::new(
            "memory.default_k",
            "Default retrieval size must be at least 1",
        ));
    }

    if let Err(e) = crate::memory::validate_collection_name(&config.memory.collection) {
        result = result.with_error(
            ValidationIssue::new("memory.collection", e.to_string())
                .with_suggestion("Use lowercase letters, digits and underscores"),
        );
    }

    if config.memory.sweep_interval.is_zero() {
        result = result.with_warning(ValidationIssue::new(
            "memory.sweep_interval",
            "Background expiry is disabled; old memories are only removed by explicit expire calls",
        ));
    }

    result
}

fn validate_index_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    match config.index.backend {
        IndexBackendType::Postgres if config.index.postgres.is_none() => {
            result = result.with_error(
                ValidationIssue::new(
                    "index.postgres",
                    "PostgreSQL backend selected but not configured",
                )
                .with_suggestion("Set DATABASE_URL environment variable or configure index.postgres"),
            );
        }
        IndexBackendType::Memory => {
            result = result.with_warning(ValidationIssue::new(
                "index.backend",
                "In-memory index selected; memories are lost on restart",
            ));
        }
        _ => {}
    }

    result
}

fn validate_embedding_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    match config.embedding.backend {
        EmbeddingBackendType::Fastembed => match fastembed_dimensions(&config.embedding.model) {
            Some(dims) if dims != config.memory.dimensions => {
                result = result.with_error(
                    ValidationIssue::new(
                        "memory.dimensions",
                        format!(
                            "Model '{}' produces {}-dim vectors but memory.dimensions is {}",
                            config.embedding.model, dims, config.memory.dimensions
                        ),
                    )
                    .with_suggestion(format!("Set memory.dimensions to {}", dims)),
                );
            }
            Some(_) => {}
            None => {
                result = result.with_error(ValidationIssue::new(
                    "embedding.model",
                    format!("Unknown fastembed model '{}'", config.embedding.model),
                ));
            }
        },
        EmbeddingBackendType::Http => {
            if url::Url::parse(&config.embedding.base_url).is_err() {
                result = result.with_error(ValidationIssue::new(
                    "embedding.base_url",
                    format!("Not a valid URL: {}", config.embedding.base_url),
                ));
            }
        }
        EmbeddingBackendType::Zero => {
            result = result.with_warning(
                ValidationIssue::new(
                    "embedding.backend",
                    "Zero-vector embedder selected: every memory is equidistant, retrieval returns insertion order",
                )
                .with_suggestion("Use the fastembed or http backend for real similarity search"),
            );
        }
    }

    result
}

fn validate_provider_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if url::Url::parse(&config.provider.base_url).is_err() {
        result = result.with_error(ValidationIssue::new(
            "provider.base_url",
            format!("Not a valid URL: {}", config.provider.base_url),
        ));
    }

    if !(0.0..=2.0).contains(&config.provider.temperature) {
        result = result.with_error(ValidationIssue::new(
            "provider.temperature",
            "Temperature must be between 0.0 and 2.0",
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = validate_config(&config);

        // Default config should have warnings but no errors
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert!(result.valid);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let mut config = Config::default();
        config.memory.dimensions = 1536;
        let result = validate_config(&config);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.path == "memory.dimensions"));
    }

    #[test]
    fn test_postgres_without_url() {
        let mut config = Config::default();
        config.index.backend = IndexBackendType::Postgres;
        let result = validate_config(&config);
        assert!(result.errors.iter().any(|e| e.path == "index.postgres"));
    }

    #[test]
    fn test_zero_embedder_warns() {
        let mut config = Config::default();
        config.embedding.backend = EmbeddingBackendType::Zero;
        let result = validate_config(&config);
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.path == "embedding.backend"));
    }

    #[test]
    fn test_bad_collection_name() {
        let mut config = Config::default();
        config.memory.collection = "memories; drop table x".into();
        let result = validate_config(&config);
        assert!(result.errors.iter().any(|e| e.path == "memory.collection"));
    }
}
