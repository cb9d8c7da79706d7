//! Error types for the RAG system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::Path;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// A corpus file could not be read as text. Aborts index initialization.
    #[error("Failed to ingest '{path}': {message}")]
    Ingest { path: String, message: String },

    /// Embedding or persistence failure while building or loading the index
    #[error("Index build failed: {0}")]
    Build(String),

    /// Index not ready, or the embedding provider failed at query time
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Generation provider failure or timeout
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create an ingestion error for a corpus path
    pub fn ingest(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Ingest {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Create a build error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create a retrieval error
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Whether this error belongs to the build phase and must abort startup
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Ingest { .. } | Error::Build(_) | Error::Config(_) | Error::Toml(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) | Error::Toml(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::Ingest { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "ingest_error"),
            Error::Build(_) => (StatusCode::SERVICE_UNAVAILABLE, "index_error"),
            Error::Retrieval(_) => (StatusCode::SERVICE_UNAVAILABLE, "retrieval_error"),
            Error::Generation(_) => (StatusCode::BAD_GATEWAY, "generation_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_mentions_path() {
        let err = Error::ingest("docs/handbook.txt", "stream did not contain valid UTF-8");
        let msg = err.to_string();
        assert!(msg.contains("docs/handbook.txt"));
        assert!(msg.contains("valid UTF-8"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_query_errors_are_not_fatal() {
        assert!(!Error::retrieval("index not ready").is_fatal());
        assert!(!Error::generation("timed out").is_fatal());
    }

    #[test]
    fn test_error_response_status() {
        let response = Error::retrieval("index not ready").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = Error::generation("timed out").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
