//! Error types for Atlas

use thiserror::Error;

/// Result type alias using Atlas's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure category, for callers that branch on the kind of failure
/// rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input, rejected before any I/O
    Validation,
    /// The vector index is unreachable, rejected a request, or timed out
    Storage,
    /// The embedding provider failed or returned a malformed vector
    Embedding,
    /// The chat-completion provider failed
    LanguageModel,
    /// Configuration is missing or inconsistent
    Config,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Stable lowercase name, used in API error bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Storage => "storage",
            ErrorKind::Embedding => "embedding",
            ErrorKind::LanguageModel => "language_model",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for Atlas
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Vector index failure
    #[error("Storage failure during {operation}: {message}")]
    Storage {
        /// Operation that failed (e.g. `store`, `search`)
        operation: &'static str,
        /// Underlying cause
        message: String,
    },

    /// Embedding provider failure
    #[error("Embedding failure during {operation}: {message}")]
    Embedding {
        /// Operation that needed the embedding
        operation: &'static str,
        /// Underlying cause
        message: String,
    },

    /// Chat-completion provider error
    #[error("Language model error: {0}")]
    LanguageModel(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a storage failure for `operation`
    pub fn storage(operation: &'static str, cause: impl std::fmt::Display) -> Self {
        Error::Storage {
            operation,
            message: cause.to_string(),
        }
    }

    /// Build an embedding failure for `operation`
    pub fn embedding(operation: &'static str, cause: impl std::fmt::Display) -> Self {
        Error::Embedding {
            operation,
            message: cause.to_string(),
        }
    }

    /// Failure category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Storage { .. } => ErrorKind::Storage,
            Error::Embedding { .. } => ErrorKind::Embedding,
            Error::LanguageModel(_) => ErrorKind::LanguageModel,
            Error::Config(_) => ErrorKind::Config,
            Error::Json(_) | Error::Io(_) | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if error is retryable
    ///
    /// Nothing in Atlas retries on its own; this is advice for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Storage | ErrorKind::Embedding | ErrorKind::LanguageModel
        )
    }

    /// Check if error is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::LanguageModel(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(Error::storage("store", "down").kind(), ErrorKind::Storage);
        assert_eq!(Error::embedding("retrieve", "bad dim").kind(), ErrorKind::Embedding);
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Config);
    }

    #[test]
    fn test_storage_message_names_operation() {
        let err = Error::storage("expire", "connection refused");
        assert_eq!(
            err.to_string(),
            "Storage failure during expire: connection refused"
        );
    }

    #[test]
    fn test_retry_advice() {
        assert!(Error::storage("store", "timeout").is_retryable());
        assert!(!Error::Validation("empty".into()).is_retryable());
        assert!(Error::Validation("empty".into()).is_client_error());
        assert!(!Error::embedding("store", "down").is_client_error());
    }
}
