//! Query handler: retrieval-grounded answers with citations.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::engine;
use crate::models::{ErrorResponse, QueryRequest, QueryResponse};
use crate::state::AppState;

/// POST /query — answer a question against a ready session. The `sources`
/// field lists the chunks actually used as evidence, in retrieval order.
pub async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let response = engine::answer_question(
        &state.http_client,
        &state.config.llm,
        &state.sessions,
        req.session_id,
        &req.question,
        state.config.retrieval_top_k,
    )
    .await
    .map_err(|e| {
        tracing::warn!("Query failed for session {}: {e}", req.session_id);
        (
            e.status(),
            Json(ErrorResponse {
                error: e.public_message().to_string(),
            }),
        )
    })?;

    Ok(Json(response))
}
