//! OpenAI-compatible chat-completion client

use crate::agent::types::*;
use crate::config::ProviderConfig;
use crate::core::{GenerationOptions, LlmProvider, LlmResponse, UsageStats};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

/// Chat-completion client for any `/chat/completions` endpoint
#[derive(Clone)]
pub struct ChatClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: ProviderConfig,
}

impl ChatClient {
    /// Create a new chat client
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();

        if let Some(ref api_key) = config.api_key {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
                    .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ChatClient { client, config })
    }

    /// Send a request to the completions endpoint
    async fn send_request(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        debug!("Sending chat completion request: model={}", request.model);

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.json::<ChatCompletionResponse>().await?;

            if let Some(ref usage) = body.usage {
                info!(
                    "Chat completion: model={}, tokens={}",
                    body.model, usage.total_tokens
                );
            }

            Ok(body)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                warn!("Rate limit exceeded: {}", error_text);
            }
            Err(Error::LanguageModel(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }
}

#[async_trait]
impl LlmProvider for ChatClient {
    fn id(&self) -> &str {
        "openai-compatible"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<LlmResponse> {
        let request = ChatCompletionRequest {
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            messages: messages.to_vec(),
            max_tokens: options.max_tokens.or(self.config.max_tokens),
            temperature: options.temperature.or(Some(self.config.temperature)),
            top_p: options.top_p,
            stream: false,
        };

        let response = self.send_request(request).await?;
        let model = response.model;
        let usage = response.usage.map(|u| UsageStats {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::LanguageModel("response contained no choices".into()))?;

        Ok(LlmResponse {
            model,
            content: choice.message.content,
            finish_reason: choice.finish_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use secrecy::SecretString;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> ProviderConfig {
        ProviderConfig {
            api_key: Some(SecretString::from("test-key")),
            base_url,
            ..Default::default()
        }
    }

    #[test]
    fn test_client_creation() {
        let client = ChatClient::new(ProviderConfig::default());
        assert!(client.is_ok());
        assert_eq!(client.unwrap().default_model(), "mixtral-8x7b");
    }

    #[tokio::test]
    async fn test_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cmpl-1",
                "object": "chat.completion",
                "created": 1,
                "model": "mixtral-8x7b",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Adherence is rising."},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(test_config(format!("{}/v1", server.uri()))).unwrap();
        let response = client
            .generate(&[Message::user("trends?")], &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(response.content, "Adherence is rising.");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.unwrap().total_tokens, 14);
    }

    #[tokio::test]
    async fn test_generate_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ChatClient::new(test_config(server.uri())).unwrap();
        let err = client
            .generate(&[Message::user("hi")], &GenerationOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::LanguageModel);
        assert!(err.to_string().contains("boom"));
    }
}
