//! HTTP server for the RAG system

pub mod routes;
pub mod state;

use axum::Router;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::orchestrator::QueryOrchestrator;
use state::AppState;

/// RAG HTTP Server
pub struct RagServer {
    state: AppState,
}

impl RagServer {
    /// Create a server around an orchestrator whose index is already initialized
    pub fn new(config: RagConfig, orchestrator: QueryOrchestrator) -> Self {
        Self {
            state: AppState::new(config, orchestrator),
        }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let router = routes::routes()
            .with_state(self.state.clone())
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

        if self.state.config().server.enable_cors {
            router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            router
        }
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting RAG server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(listener, router).await?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        let server = &self.state.config().server;
        format!("{}:{}", server.host, server.port)
    }
}
