//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;
use crate::generation::Prompt;

/// Trait for LLM-based answer generation
///
/// Model and temperature are fixed when the provider is built.
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one blocking, non-streaming generation for an assembled prompt
    async fn generate(&self, prompt: &Prompt) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
