//! Persistent vector index with a build-or-load lifecycle
//!
//! On first start the corpus is ingested, chunked and embedded, and the result
//! is persisted under the configured directory. Later starts find that
//! directory and load it without touching the embedding provider.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::ingestion::{CorpusLoader, RecursiveTextSplitter};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

/// File holding the serialized index inside the index directory
pub const INDEX_FILE: &str = "index.json";

/// Persisted layout version
const FORMAT_VERSION: u32 = 1;

/// Lifecycle of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Uninitialized,
    Loading,
    Building,
    Persisting,
    Ready,
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexState::Uninitialized => "uninitialized",
            IndexState::Loading => "loading",
            IndexState::Building => "building",
            IndexState::Persisting => "persisting",
            IndexState::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// A chunk together with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A search hit
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is better)
    pub score: f32,
}

/// On-disk representation of the index
#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    embedding_model: String,
    dimensions: usize,
    created_at: DateTime<Utc>,
    entries: Vec<IndexedChunk>,
}

struct IndexInner {
    state: IndexState,
    dimensions: usize,
    entries: Vec<IndexedChunk>,
}

/// Vector index over the corpus chunks
pub struct VectorIndex {
    /// Directory holding the persisted index
    path: PathBuf,
    /// Embeds chunks at build time and queries at search time
    embedder: Arc<dyn EmbeddingProvider>,
    /// Readers only contend with initialization
    inner: RwLock<IndexInner>,
    /// Serializes initialization
    init_lock: Mutex<()>,
}

impl VectorIndex {
    /// Create an uninitialized index persisted under `path`
    pub fn new(path: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            path: path.into(),
            embedder,
            inner: RwLock::new(IndexInner {
                state: IndexState::Uninitialized,
                dimensions: 0,
                entries: Vec::new(),
            }),
            init_lock: Mutex::new(()),
        }
    }

    /// Directory holding the persisted index
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current lifecycle state
    pub fn state(&self) -> IndexState {
        self.inner.read().state
    }

    /// Whether the index can serve searches
    pub fn is_ready(&self) -> bool {
        self.state() == IndexState::Ready
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding dimensionality (0 until initialized)
    pub fn dimensions(&self) -> usize {
        self.inner.read().dimensions
    }

    /// Load the persisted index if its directory exists, otherwise build it
    /// from the corpus and persist it. Does nothing once the index is ready.
    ///
    /// On failure the index returns to `Uninitialized`.
    pub async fn initialize(&self, loader: &CorpusLoader, splitter: &RecursiveTextSplitter) -> Result<()> {
        let _guard = self.init_lock.lock().await;

        if self.is_ready() {
            tracing::debug!("Index already initialized, skipping");
            return Ok(());
        }

        let result = if self.path.exists() {
            self.load().await
        } else {
            self.build(loader, splitter).await
        };

        match result {
            Ok((dimensions, entries)) => {
                tracing::info!(
                    "Vector index ready: {} chunks, {} dimensions",
                    entries.len(),
                    dimensions
                );
                let mut inner = self.inner.write();
                inner.dimensions = dimensions;
                inner.entries = entries;
                inner.state = IndexState::Ready;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Vector index initialization failed: {}", e);
                self.set_state(IndexState::Uninitialized);
                Err(e)
            }
        }
    }

    async fn load(&self) -> Result<(usize, Vec<IndexedChunk>)> {
        self.set_state(IndexState::Loading);
        tracing::info!("Loading existing vector index from {}", self.path.display());

        let file = self.path.join(INDEX_FILE);
        let raw = tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| Error::build(format!("failed to read {}: {}", file.display(), e)))?;
        let persisted: PersistedIndex = serde_json::from_str(&raw)
            .map_err(|e| Error::build(format!("corrupt index {}: {}", file.display(), e)))?;

        if persisted.version != FORMAT_VERSION {
            return Err(Error::build(format!(
                "unsupported index version {} (expected {})",
                persisted.version, FORMAT_VERSION
            )));
        }
        if persisted.embedding_model != self.embedder.model() {
            tracing::warn!(
                "Index was built with embedding model '{}' but '{}' is configured; rebuild if results look wrong",
                persisted.embedding_model,
                self.embedder.model()
            );
        }
        if let Some(bad) = persisted
            .entries
            .iter()
            .find(|e| e.embedding.len() != persisted.dimensions)
        {
            return Err(Error::build(format!(
                "entry from {} has {} dimensions, index declares {}",
                bad.chunk.source,
                bad.embedding.len(),
                persisted.dimensions
            )));
        }

        Ok((persisted.dimensions, persisted.entries))
    }

    async fn build(
        &self,
        loader: &CorpusLoader,
        splitter: &RecursiveTextSplitter,
    ) -> Result<(usize, Vec<IndexedChunk>)> {
        self.set_state(IndexState::Building);
        tracing::info!("Building vector index from {}", loader.root().display());

        let documents = loader.load()?;
        let chunks = splitter.chunk_documents(&documents);
        if chunks.is_empty() {
            return Err(Error::build(format!(
                "corpus at {} produced no chunks",
                loader.root().display()
            )));
        }

        tracing::info!(
            "Embedding {} chunks from {} documents with {}",
            chunks.len(),
            documents.len(),
            self.embedder.name()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| Error::build(format!("embedding failed: {}", e)))?;

        if embeddings.len() != chunks.len() {
            return Err(Error::build(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = embeddings.first().map_or(0, Vec::len);
        if dimensions == 0 || embeddings.iter().any(|e| e.len() != dimensions) {
            return Err(Error::build("embedder returned vectors of inconsistent dimensionality"));
        }

        let entries: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        self.set_state(IndexState::Persisting);
        let persisted = PersistedIndex {
            version: FORMAT_VERSION,
            embedding_model: self.embedder.model().to_string(),
            dimensions,
            created_at: Utc::now(),
            entries,
        };
        self.persist(&persisted).await?;

        Ok((dimensions, persisted.entries))
    }

    /// Write the index into a temporary sibling directory, then move it into
    /// place so the configured path only ever appears complete.
    async fn persist(&self, persisted: &PersistedIndex) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| Error::build(format!("failed to create {}: {}", parent.display(), e)))?;

        let staging = tempfile::Builder::new()
            .prefix(".index-staging-")
            .tempdir_in(&parent)
            .map_err(|e| Error::build(format!("failed to create staging directory: {}", e)))?;

        let json = serde_json::to_vec(persisted)?;
        tokio::fs::write(staging.path().join(INDEX_FILE), json)
            .await
            .map_err(|e| Error::build(format!("failed to write index: {}", e)))?;

        tokio::fs::rename(staging.path(), &self.path).await.map_err(|e| {
            Error::build(format!("failed to move index into {}: {}", self.path.display(), e))
        })?;
        // Contents now live at `self.path`; nothing left for the guard to clean up
        let _ = staging.keep();

        tracing::info!(
            "Persisted {} chunks to {}",
            persisted.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn set_state(&self, state: IndexState) {
        tracing::debug!("Vector index state -> {}", state);
        self.inner.write().state = state;
    }

    /// Embed `query` and return the `k` most similar chunks by cosine
    /// similarity, best first. Equal scores keep index order.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let state = self.state();
        if state != IndexState::Ready {
            return Err(Error::retrieval(format!("vector index is not ready (state: {})", state)));
        }

        let query_embedding = self.embedder.embed(query).await.map_err(|e| match e {
            Error::Retrieval(_) => e,
            other => Error::retrieval(format!("query embedding failed: {}", other)),
        })?;

        let inner = self.inner.read();
        if query_embedding.len() != inner.dimensions {
            return Err(Error::retrieval(format!(
                "query embedding has {} dimensions, index has {}",
                query_embedding.len(),
                inner.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = inner
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&query_embedding, &entry.embedding)))
            .collect();

        // Stable sort: ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: inner.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }
}

/// Cosine similarity; zero vectors score 0
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Create the index described by `config` and bring it to `Ready`
pub async fn initialize_index(
    config: &RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<VectorIndex>> {
    let index = VectorIndex::new(&config.index.path, embedder);
    let loader = CorpusLoader::from_config(&config.corpus);
    let splitter = RecursiveTextSplitter::from_config(&config.chunking);

    index.initialize(&loader, &splitter).await?;

    Ok(Arc::new(index))
}
