//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::orchestrator::QueryOrchestrator;
use crate::retrieval::IndexState;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Query pipeline over the initialized index
    orchestrator: QueryOrchestrator,
}

impl AppState {
    /// Create state around a ready orchestrator
    pub fn new(config: RagConfig, orchestrator: QueryOrchestrator) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, orchestrator }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the query pipeline
    pub fn orchestrator(&self) -> &QueryOrchestrator {
        &self.inner.orchestrator
    }

    /// Lifecycle state of the underlying index
    pub fn index_state(&self) -> IndexState {
        self.inner.orchestrator.retriever().index().state()
    }

    /// Whether queries can be served
    pub fn is_ready(&self) -> bool {
        self.index_state() == IndexState::Ready
    }
}
