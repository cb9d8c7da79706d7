//! corpus-rag: question answering over a private document folder
//!
//! Documents are chunked and embedded once into a persistent vector index.
//! Each question retrieves the most similar chunks, which are handed to a
//! local Ollama model as context. The model's answer is stripped of any
//! reasoning it leaked before being returned with its sources.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod orchestrator;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use orchestrator::QueryOrchestrator;
pub use retrieval::{initialize_index, VectorIndex};
pub use types::{
    document::{Chunk, Document},
    query::QueryRequest,
    response::{Answer, QueryResponse},
};
