//! Gateway module - HTTP API over the agent and its memory
//!
//! ```text
//! POST   /query               answer a query from memory
//! GET    /health              liveness
//! POST   /memories            store a memory
//! POST   /memories/search     nearest memories to a query
//! DELETE /memories/expired    drop memories older than max_age
//! GET    /memories/count      number of stored memories
//! ```

pub mod protocol;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use humantime_serde::re::humantime;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agent::{Agent, AgentResponse};
use crate::error::{Error, ErrorKind, Result};
use crate::memory::MemoryStore;
use protocol::*;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Query pipeline
    pub agent: Arc<Agent>,
    /// Memory store shared with the agent
    pub memory: MemoryStore,
}

impl AppState {
    /// Build state around `agent` and its memory store
    pub fn new(agent: Agent) -> Self {
        let memory = agent.memory().clone();
        AppState {
            agent: Arc::new(agent),
            memory,
        }
    }
}

// ---- Error Handling ----

/// Library error rendered as a JSON error reply
pub struct ApiError(Error);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Storage => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Embedding | ErrorKind::LanguageModel => StatusCode::BAD_GATEWAY,
            ErrorKind::Config | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let request_id = Uuid::new_v4().to_string();

        if status.is_server_error() {
            error!(request_id = %request_id, "Request failed: {}", self.0);
        } else {
            warn!(request_id = %request_id, "Request rejected: {}", self.0);
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
            kind: self.0.kind().as_str().to_string(),
            timestamp: Utc::now(),
            request_id,
        };
        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Error::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(Error::Validation(rejection.body_text()))
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// ---- Handlers ----

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}

async fn query(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Json<AgentResponse>> {
    let Json(request) = payload?;
    let (text, context) = request.into_parts();
    let response = state.agent.process_query(&text, Some(context)).await?;
    Ok(Json(response))
}

async fn store_memory(
    State(state): State<AppState>,
    payload: std::result::Result<Json<StoreRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StoreResponse>)> {
    let Json(request) = payload?;
    state.memory.store(&request.text, request.metadata).await?;
    Ok((StatusCode::CREATED, Json(StoreResponse { stored: true })))
}

async fn search_memories(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Json(request) = payload?;
    let results = match request.k {
        None => state.memory.retrieve_default(&request.query).await?,
        Some(k) if k < 1 => {
            return Err(Error::Validation(format!("k must be at least 1, got {}", k)).into())
        }
        Some(k) => {
            let k = usize::try_from(k).unwrap_or(usize::MAX);
            state.memory.retrieve(&request.query, k).await?
        }
    };
    Ok(Json(SearchResponse { results }))
}

async fn expire_memories(
    State(state): State<AppState>,
    params: std::result::Result<Query<ExpireParams>, QueryRejection>,
) -> ApiResult<Json<ExpireResponse>> {
    let Query(params) = params?;
    let deleted = match params.max_age {
        None => state.memory.expire_default().await?,
        Some(raw) => {
            let max_age = humantime::parse_duration(&raw)
                .map_err(|e| Error::Validation(format!("invalid max_age '{}': {}", raw, e)))?;
            let max_age = chrono::Duration::from_std(max_age)
                .map_err(|_| Error::Validation(format!("max_age '{}' is out of range", raw)))?;
            state.memory.expire(max_age).await?
        }
    };
    Ok(Json(ExpireResponse { deleted }))
}

async fn count_memories(State(state): State<AppState>) -> ApiResult<Json<CountResponse>> {
    let count = state.memory.count().await?;
    Ok(Json(CountResponse { count }))
}

// ---- Router ----

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/query", post(query))
        .route("/memories", post(store_memory))
        .route("/memories/search", post(search_memories))
        .route("/memories/expired", delete(expire_memories))
        .route("/memories/count", get(count_memories))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Gateway listening on http://{}", addr);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Gateway stopped");
    Ok(())
}
