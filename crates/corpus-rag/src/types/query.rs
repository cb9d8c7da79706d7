//! Query request types

use serde::{Deserialize, Serialize};

/// Chat request accepted by the query API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub query: String,

    /// Number of chunks to retrieve. Absent or < 1 falls back to the configured default.
    #[serde(default)]
    pub k: Option<i64>,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            k: None,
        }
    }

    /// Set the number of results to retrieve
    pub fn with_k(mut self, k: i64) -> Self {
        self.k = Some(k);
        self
    }

    /// The requested `k` if it is a usable positive count
    pub fn requested_k(&self) -> Option<usize> {
        self.k
            .filter(|k| *k >= 1)
            .and_then(|k| usize::try_from(k).ok())
    }
}
