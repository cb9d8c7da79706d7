//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main RAG system configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Corpus source configuration
    pub corpus: CorpusConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Answer generation configuration
    pub generation: GenerationConfig,
    /// Ollama connection configuration
    pub ollama: OllamaConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Persisted index configuration
    pub index: IndexConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Check that the parameters are consistent
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.default_k == 0 {
            return Err(Error::Config("default_k must be at least 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(Error::Config(format!(
                "temperature {} is outside 0.0..=2.0",
                self.generation.temperature
            )));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable permissive CORS for browser chat clients
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// Corpus source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Root folder scanned recursively at build time
    pub source_dir: PathBuf,
    /// File extensions to ingest (empty = every file)
    pub extensions: Vec<String>,
    /// Follow symbolic links while walking the corpus
    pub follow_links: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("documents"),
            extensions: Vec::new(),
            follow_links: false,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
        }
    }
}

/// Answer generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Generation model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on a single generation call, in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "deepseek-r1".to_string(),
            temperature: 0.3,
            timeout_secs: 180,
        }
    }
}

/// Ollama connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub base_url: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved when a query does not specify a valid `k`
    pub default_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { default_k: 4 }
    }
}

/// Persisted index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding the persisted index
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("vector_index"),
        }
    }
}
