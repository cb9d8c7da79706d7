//! Query-time retrieval over the vector index

use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;

use super::index::{ScoredChunk, VectorIndex};

/// Chunks retrieved for one query, most similar first
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    /// Source of every hit, in retrieval order (duplicates kept)
    pub fn sources(&self) -> Vec<String> {
        self.hits.iter().map(|hit| hit.chunk.source.clone()).collect()
    }

    /// Text of every hit, in retrieval order
    pub fn texts(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.chunk.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Thin layer over the index that enforces a usable `k`
#[derive(Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    default_k: usize,
}

impl Retriever {
    /// Create a retriever. A `default_k` of 0 is raised to 1.
    pub fn new(index: Arc<VectorIndex>, default_k: usize) -> Self {
        Self {
            index,
            default_k: default_k.max(1),
        }
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// The `k` actually used for a request
    pub fn effective_k(&self, k: Option<usize>) -> usize {
        k.filter(|k| *k >= 1).unwrap_or(self.default_k)
    }

    /// Retrieve the most similar chunks. Order is exactly the index's
    /// similarity order.
    pub async fn retrieve(&self, query: &str, k: Option<usize>) -> Result<RetrievalResult> {
        let k = self.effective_k(k);
        let hits = self.index.similarity_search(query, k).await?;

        tracing::debug!("Retrieved {} chunks (k={}) for query", hits.len(), k);

        Ok(RetrievalResult { hits })
    }
}
