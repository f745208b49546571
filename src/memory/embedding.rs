//! Embedding providers
//!
//! - `FastEmbedder`: local model via fastembed, loaded on first use
//! - `HttpEmbedder`: any OpenAI-compatible `/embeddings` endpoint
//! - `ZeroEmbedder`: all-zero vectors, a functional no-op (see below)

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{Config, EmbeddingBackendType};
use crate::core::Embedder;
use crate::error::{Error, Result};

use super::cache::CachedEmbedder;

/// Known fastembed models and their output width
fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    let resolved = match name {
        "all-MiniLM-L6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
        "all-MiniLM-L12-v2" => (EmbeddingModel::AllMiniLML12V2, 384),
        "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
        "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
        "bge-large-en-v1.5" => (EmbeddingModel::BGELargeENV15, 1024),
        "nomic-embed-text-v1.5" => (EmbeddingModel::NomicEmbedTextV15, 768),
        "multilingual-e5-small" => (EmbeddingModel::MultilingualE5Small, 384),
        "multilingual-e5-base" => (EmbeddingModel::MultilingualE5Base, 768),
        "multilingual-e5-large" => (EmbeddingModel::MultilingualE5Large, 1024),
        "mxbai-embed-large-v1" => (EmbeddingModel::MxbaiEmbedLargeV1, 1024),
        _ => return None,
    };
    Some(resolved)
}

/// Output width of a known fastembed model
pub fn fastembed_dimensions(name: &str) -> Option<usize> {
    resolve_model(name).map(|(_, dims)| dims)
}

/// Local embedding service wrapping fastembed
///
/// The model downloads and loads on the first `embed` call and is shared by
/// every clone afterwards.
#[derive(Clone)]
pub struct FastEmbedder {
    model_name: String,
    model_id: EmbeddingModel,
    dimensions: usize,
    model: Arc<OnceCell<Arc<TextEmbedding>>>,
}

impl FastEmbedder {
    /// Create an embedder for a known fastembed model
    pub fn new(model_name: &str) -> Result<Self> {
        let (model_id, dimensions) = resolve_model(model_name).ok_or_else(|| {
            Error::Config(format!(
                "Unknown embedding model: '{}'. Supported: multilingual-e5-small, all-MiniLM-L6-v2, bge-base-en-v1.5, ...",
                model_name
            ))
        })?;

        Ok(FastEmbedder {
            model_name: model_name.to_string(),
            model_id,
            dimensions,
            model: Arc::new(OnceCell::new()),
        })
    }

    async fn model(&self) -> Result<Arc<TextEmbedding>> {
        self.model
            .get_or_try_init(|| async {
                info!("Loading embedding model {}", self.model_name);
                let model_id = self.model_id.clone();
                let model = tokio::task::spawn_blocking(move || {
                    TextEmbedding::try_new(
                        InitOptions::new(model_id).with_show_download_progress(true),
                    )
                })
                .await
                .map_err(|e| Error::embedding("load model", format!("task join error: {}", e)))?
                .map_err(|e| Error::embedding("load model", e))?;
                Ok::<_, Error>(Arc::new(model))
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    fn id(&self) -> &str {
        "fastembed"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.model().await?;
        let text = text.to_string();

        tokio::task::spawn_blocking(move || {
            let embeddings = model
                .embed(vec![text], None)
                .map_err(|e| Error::embedding("embed", e))?;
            embeddings
                .into_iter()
                .next()
                .ok_or_else(|| Error::embedding("embed", "no embedding returned"))
        })
        .await
        .map_err(|e| Error::embedding("embed", format!("task join error: {}", e)))?
    }
}

/// Request body for `/embeddings`
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response body from `/embeddings`
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedder backed by an OpenAI-compatible HTTP API
#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    dimensions: usize,
}

impl HttpEmbedder {
    /// Create a client for `base_url` producing `dimensions`-wide vectors
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpEmbedder {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn id(&self) -> &str {
        "http"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);
        debug!("Requesting embedding from {}: model={}", url, self.model);

        let mut request = self.client.post(&url).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::embedding("embed", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::embedding(
                "embed",
                format!("API error ({}): {}", status, error_text),
            ));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding("embed", e))?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::embedding("embed", "no embedding returned"))
    }
}

/// Placeholder embedder returning all-zero vectors.
///
/// This is a functional no-op: every text maps to the same point, so all
/// stored memories are equidistant from every query and retrieval degrades
/// to index order. Only useful for wiring checks without a model.
#[derive(Debug, Clone)]
pub struct ZeroEmbedder {
    dimensions: usize,
}

impl ZeroEmbedder {
    /// Create a zero embedder of the given width
    pub fn new(dimensions: usize) -> Self {
        warn!(
            "Zero-vector embedder in use: similarity search is disabled, retrieval returns insertion order"
        );
        ZeroEmbedder { dimensions }
    }
}

#[async_trait]
impl Embedder for ZeroEmbedder {
    fn id(&self) -> &str {
        "zero"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.0; self.dimensions])
    }
}

/// Build the embedder described by `config`, cached if enabled
pub fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embedding = &config.embedding;

    let inner: Arc<dyn Embedder> = match embedding.backend {
        EmbeddingBackendType::Fastembed => Arc::new(FastEmbedder::new(&embedding.model)?),
        EmbeddingBackendType::Http => Arc::new(HttpEmbedder::new(
            embedding.base_url.clone(),
            embedding.model.clone(),
            embedding.api_key.clone(),
            config.memory.dimensions,
            config.memory.embed_timeout,
        )?),
        EmbeddingBackendType::Zero => Arc::new(ZeroEmbedder::new(config.memory.dimensions)),
    };

    info!(
        "Embedding provider: {} ({} dims, cache={})",
        inner.id(),
        inner.dimensions(),
        embedding.cache
    );

    if embedding.cache && embedding.backend != EmbeddingBackendType::Zero {
        Ok(Arc::new(CachedEmbedder::new(inner)))
    } else {
        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_known_model_dimensions() {
        assert_eq!(fastembed_dimensions("multilingual-e5-small"), Some(384));
        assert_eq!(fastembed_dimensions("bge-large-en-v1.5"), Some(1024));
        assert_eq!(fastembed_dimensions("mixtral-8x7b"), None);
    }

    #[test]
    fn test_unknown_fastembed_model_is_config_error() {
        let err = FastEmbedder::new("not-a-model").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_zero_embedder_width() {
        let embedder = ZeroEmbedder::new(8);
        let v = embedder.embed("anything").await.unwrap();
        assert_eq!(v, vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_http_embedder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(serde_json::json!({"model": "text-embedding-3-small", "input": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{"object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3]}]
            })))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(
            format!("{}/v1/", server.uri()),
            "text-embedding-3-small",
            Some(SecretString::from("sk-test")),
            3,
            Duration::from_secs(5),
        )
        .unwrap();

        let v = embedder.embed("hello").await.unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_http_embedder_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let embedder =
            HttpEmbedder::new(server.uri(), "m", None, 3, Duration::from_secs(5)).unwrap();

        let err = embedder.embed("hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Embedding);
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn test_build_zero_embedder_skips_cache() {
        let mut config = Config::default();
        config.embedding.backend = EmbeddingBackendType::Zero;
        config.memory.dimensions = 16;
        let embedder = build_embedder(&config).unwrap();
        assert_eq!(embedder.id(), "zero");
        assert_eq!(embedder.dimensions(), 16);
    }
}
