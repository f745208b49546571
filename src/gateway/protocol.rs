//! Gateway wire types
//!
//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::QueryContext;
use crate::core::{Metadata, ScoredMemory};

/// `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Query text
    pub text: String,
    /// Voice the answer should take
    #[serde(default)]
    pub persona: Option<String>,
    /// Subject area
    #[serde(default)]
    pub domain: Option<String>,
    /// Caller's user identifier
    #[serde(default)]
    pub user_id: Option<String>,
    /// Free-form caller context
    #[serde(default)]
    pub metadata: Metadata,
}

impl QueryRequest {
    /// Split into the query text and its context
    pub fn into_parts(self) -> (String, QueryContext) {
        let context = QueryContext {
            persona: self.persona,
            domain: self.domain,
            user_id: self.user_id,
            metadata: self.metadata,
        };
        (self.text, context)
    }
}

/// `POST /memories`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRequest {
    /// Memory text
    pub text: String,
    /// Caller-supplied context stored alongside the text
    #[serde(default)]
    pub metadata: Metadata,
}

/// Reply to a successful `POST /memories`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreResponse {
    /// Always true on success
    pub stored: bool,
}

/// `POST /memories/search`
///
/// `k` is signed on the wire so that zero and negative values reach
/// validation instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text
    pub query: String,
    /// Result count; configured default when absent
    #[serde(default)]
    pub k: Option<i64>,
}

/// Reply to `POST /memories/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Closest first
    pub results: Vec<ScoredMemory>,
}

/// Query string of `DELETE /memories/expired`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpireParams {
    /// Human-readable duration such as `15days`; configured default when absent
    pub max_age: Option<String>,
}

/// Reply to `DELETE /memories/expired`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpireResponse {
    /// Number of memories removed
    pub deleted: u64,
}

/// Reply to `GET /memories/count`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Memories in the collection
    pub count: u64,
}

/// Reply to `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy`
    pub status: String,
    /// Server time
    pub timestamp: DateTime<Utc>,
}

/// Body of every error reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Stable failure category, e.g. `validation`
    pub kind: String,
    /// Time the error was produced
    pub timestamp: DateTime<Utc>,
    /// Identifier echoed in the server log
    pub request_id: String,
}
