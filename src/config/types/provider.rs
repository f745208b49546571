//! Provider configuration types
//!
//! Configuration for the chat-completion provider the agent answers with.
//! Any OpenAI-compatible `/chat/completions` endpoint works.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Chat-completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (omitted for local servers)
    #[serde(skip_serializing, default)]
    pub api_key: Option<SecretString>,
    /// Base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Replaces the built-in system prompt when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            api_key: None,
            base_url: default_base_url(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_timeout(),
            system_prompt: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/v1".to_string()
}

fn default_model() -> String {
    "mixtral-8x7b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout() -> u64 {
    120
}
