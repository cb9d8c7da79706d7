//! Ollama client and the provider implementations built on it
//!
//! One `OllamaClient` is shared by the embedder and the LLM so both use the
//! same connection pool and retry policy.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{GenerationConfig, OllamaConfig};
use crate::error::{Error, Result};
use crate::generation::Prompt;

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Server base URL
    base_url: String,
    /// Maximum retries
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Failure of a single request attempt
#[derive(Debug)]
enum RequestError {
    /// Transport failure or server-side (5xx) error; worth retrying
    Transient(String),
    /// Client error or malformed response; retrying cannot help
    Permanent(String),
}

impl RequestError {
    /// Classify a non-success HTTP status
    fn from_status(status: StatusCode, message: String) -> Self {
        if status.is_server_error() {
            RequestError::Transient(message)
        } else {
            RequestError::Permanent(message)
        }
    }

    fn into_message(self) -> String {
        match self {
            RequestError::Transient(m) | RequestError::Permanent(m) => m,
        }
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Transient(m) | RequestError::Permanent(m) => f.write_str(m),
        }
    }
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    /// Server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry transient failures with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> std::result::Result<T, String>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(RequestError::Permanent(e)) => return Err(e),
                Err(e) => {
                    if attempt < self.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Ollama request failed (attempt {}/{}): {}; retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            e,
                            delay
                        );
                        sleep(delay).await;
                    }
                    last_error = Some(e.into_message());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| "unknown error".to_string()))
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding with retry
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let url = url.as_str();
        let client = &self.client;

        self.retry_request(|| async move {
            let response = client
                .post(url)
                .json(&EmbedRequest { model, prompt: text })
                .send()
                .await
                .map_err(|e| RequestError::Transient(format!("embedding request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(RequestError::from_status(
                    status,
                    format!("embedding failed: HTTP {}", status),
                ));
            }

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                RequestError::Permanent(format!("failed to parse embedding response: {}", e))
            })?;

            if embed_response.embedding.is_empty() {
                return Err(RequestError::Permanent(format!(
                    "model '{}' returned an empty embedding",
                    model
                )));
            }

            Ok(embed_response.embedding)
        })
        .await
        .map_err(Error::Retrieval)
    }

    /// Run a non-streaming chat completion with retry
    pub async fn chat(&self, model: &str, temperature: f32, prompt: &Prompt) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let url = url.as_str();
        let client = &self.client;

        tracing::info!("Generating answer with model: {}", model);

        self.retry_request(|| async move {
            let request = ChatRequest {
                model,
                messages: vec![
                    ChatMessage { role: "system", content: &prompt.system },
                    ChatMessage { role: "user", content: &prompt.user },
                ],
                stream: false,
                options: ChatOptions { temperature },
            };

            let response = client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| RequestError::Transient(format!("generation request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RequestError::from_status(
                    status,
                    format!("generation failed: HTTP {} - {}", status, body),
                ));
            }

            let chat_response: ChatResponse = response.json().await.map_err(|e| {
                RequestError::Permanent(format!("failed to parse generation response: {}", e))
            })?;

            Ok(chat_response.message.content)
        })
        .await
        .map_err(Error::Generation)
    }
}

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaEmbedder {
    /// Create from an existing OllamaClient
    pub fn new(client: Arc<OllamaClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(&self.model, text).await
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
}

impl OllamaLlm {
    /// Create from an existing OllamaClient
    pub fn new(client: Arc<OllamaClient>, config: &GenerationConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Sampling temperature
    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        self.client.chat(&self.model, self.temperature, prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
