//! Vector index and retrieval

pub mod index;
pub mod retriever;

pub use index::{initialize_index, IndexState, IndexedChunk, ScoredChunk, VectorIndex, INDEX_FILE};
pub use retriever::{RetrievalResult, Retriever};
