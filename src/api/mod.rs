//! Axum HTTP façade: the four operations, orchestration only.

pub mod query;
pub mod sessions;

use axum::Json;

use crate::models::StatusResponse;

/// GET /status — liveness probe.
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "repo-qa is up".to_string(),
    })
}
