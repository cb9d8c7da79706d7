//! Corpus ingestion: folder loading and chunking

mod chunker;
mod loader;

pub use chunker::{RecursiveTextSplitter, DEFAULT_SEPARATORS};
pub use loader::CorpusLoader;
