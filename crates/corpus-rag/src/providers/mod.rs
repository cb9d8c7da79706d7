//! Provider abstractions for embeddings and text generation
//!
//! The core pipeline only sees the traits; `ollama` holds the HTTP-backed
//! implementations used by the server.

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
