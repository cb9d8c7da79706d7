//! Chat endpoint

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /chat - Answer a question from the corpus
///
/// Always responds 200; pipeline failures are reported in `answer` with
/// empty `sources`.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    let answer = state
        .orchestrator()
        .answer(&request.query, request.requested_k())
        .await;

    Json(QueryResponse::from(answer))
}
