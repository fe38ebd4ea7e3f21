//! Ollama HTTP client.

use crate::error::{OllamaError, OllamaResult};
use crate::types::{GenerateRequest, GenerateResponse};
use cram_config::OllamaConfig;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Client for interacting with Ollama's API.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Self::with_timeout(&config.host, Duration::from_secs(config.timeout_seconds))
    }

    /// Create a new client with default settings.
    pub fn new(host: impl Into<String>) -> OllamaResult<Self> {
        Self::with_timeout(&host.into(), Duration::from_secs(120))
    }

    fn with_timeout(host: &str, timeout: Duration) -> OllamaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OllamaError::Http)?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Check if Ollama server is available.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.host);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Generate text (non-streaming).
    pub async fn generate(&self, request: GenerateRequest) -> OllamaResult<GenerateResponse> {
        let url = format!("{}/api/generate", self.host);
        debug!("Generating with model {}", request.model);

        // Ensure streaming is off for this method
        let mut request = request;
        request.stream = false;

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    OllamaError::ServerNotRunning {
                        host: self.host.clone(),
                    }
                } else if e.is_timeout() {
                    OllamaError::Timeout {
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    OllamaError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            if text.contains("not found") || status.as_u16() == 404 {
                return Err(OllamaError::ModelNotFound {
                    model: request.model,
                });
            }

            return Err(OllamaError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let generate_response: GenerateResponse = response.json().await?;
        Ok(generate_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_generate_happy_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .json_body(serde_json::json!({ "response": "hello", "done": true }));
        });

        let client = OllamaClient::new(server.base_url()).unwrap();
        let response = client
            .generate(GenerateRequest::new("test-model", "say hello"))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.response, "hello");
        assert!(response.done);
    }

    #[tokio::test]
    async fn test_generate_missing_model() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(404).body("model 'nope' not found");
        });

        let client = OllamaClient::new(server.base_url()).unwrap();
        let err = client
            .generate(GenerateRequest::new("nope", "hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, OllamaError::ModelNotFound { .. }));
    }

    #[tokio::test]
    async fn test_is_available() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(serde_json::json!({ "models": [] }));
        });

        let client = OllamaClient::new(server.base_url()).unwrap();
        assert!(client.is_available().await);
    }
}
