//! Response types for RAG queries

use serde::{Deserialize, Serialize};

/// Final answer produced for one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// User-facing answer text
    pub text: String,
    /// Source identifiers, parallel to the retrieved chunks
    pub sources: Vec<String>,
}

impl Answer {
    /// Create an answer
    pub fn new(text: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }

    /// Degraded answer carrying an error message and no sources
    pub fn from_error(err: &crate::Error) -> Self {
        Self {
            text: format!("Error: {}", err),
            sources: Vec::new(),
        }
    }

    /// Whether this answer is a converted failure
    pub fn is_error(&self) -> bool {
        self.sources.is_empty() && self.text.starts_with("Error:")
    }
}

/// Wire format of the query API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Answer text
    pub answer: String,
    /// Source identifiers
    pub sources: Vec<String>,
}

impl From<Answer> for QueryResponse {
    fn from(answer: Answer) -> Self {
        Self {
            answer: answer.text,
            sources: answer.sources,
        }
    }
}
