//! Routes for the RAG server

pub mod chat;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/chat", post(chat::chat))
}

/// GET / - Service banner
async fn root() -> Json<Value> {
    Json(json!({
        "name": "corpus-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// GET /health - Liveness plus index state
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let index_state = state.index_state();
    let (status, label) = if state.is_ready() {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(json!({
            "status": label,
            "index": index_state,
            "embedding_model": state.config().embeddings.model,
            "generation_model": state.config().generation.model,
        })),
    )
}
