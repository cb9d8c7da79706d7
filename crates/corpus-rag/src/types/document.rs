//! Document and chunk types with source tracking

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A source file read from the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Full text content
    pub content: String,
    /// Source identifier (the file path)
    pub source: String,
}

impl Document {
    /// Create a new document
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }

    /// Create a document whose source is a filesystem path
    pub fn from_path(content: String, path: &Path) -> Self {
        Self {
            content,
            source: path.display().to_string(),
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// A bounded slice of a document, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content, a contiguous slice of the parent document
    pub text: String,
    /// Source identifier inherited from the parent document
    pub source: String,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Character range in the parent document
    pub char_start: usize,
    pub char_end: usize,
}

impl Chunk {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}
