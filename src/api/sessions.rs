//! Session lifecycle handlers: clone a repository into a fresh session,
//! remove a session and its resources.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::path::PathBuf;
use uuid::Uuid;

use crate::chunking::{chunk_source_files, ChunkParams};
use crate::error::{FetchError, IngestError};
use crate::git;
use crate::index::{build_index, VectorIndex};
use crate::models::{CloneRequest, CloneResponse, ErrorResponse, RemoveRequest, RemoveResponse};
use crate::state::AppState;

/// POST /clone — clone, chunk, embed and index a repository into a new
/// session. The response carries the session id once the session is ready;
/// any pipeline failure surfaces here as a generic error while the typed
/// reason goes to the log.
pub async fn clone_session(
    State(state): State<AppState>,
    Json(req): Json<CloneRequest>,
) -> Result<Json<CloneResponse>, (StatusCode, Json<ErrorResponse>)> {
    let url = req.repo_url.trim().to_string();

    // Reject bad URLs before a session exists: the registry must stay
    // untouched for malformed input.
    if let Err(e) = git::validate_repo_url(&url) {
        tracing::warn!("Rejected clone request for {url:?}: {e}");
        return Err(error_response(&IngestError::Fetch(e)));
    }

    let session_id = state.sessions.register(&url, &state.config.sessions_dir());
    tracing::info!("Session {session_id} created for {url}");

    // The pipeline runs in its own task; awaiting the handle (rather than the
    // future directly) means a client disconnect cannot cancel ingestion
    // half-way and strand the session in Cloning.
    let task_state = state.clone();
    let task_url = url.clone();
    let handle = tokio::spawn(async move { ingest(task_state, session_id, task_url).await });

    match handle.await {
        Ok(Ok(())) => Ok(Json(CloneResponse { session_id })),
        Ok(Err(e)) => {
            tracing::error!("Ingestion failed for session {session_id} ({url}): {e:#}");
            Err(error_response(&e))
        }
        Err(e) => {
            state.sessions.mark_failed(session_id);
            let err = IngestError::Internal(e.to_string());
            tracing::error!("Ingestion task panicked for session {session_id}: {e}");
            Err(error_response(&err))
        }
    }
}

/// POST /remove — release a session's working area and index.
/// Idempotent: removing an unknown or already-removed session still
/// succeeds.
pub async fn remove_session(
    State(state): State<AppState>,
    Json(req): Json<RemoveRequest>,
) -> Json<RemoveResponse> {
    if let Some(dir) = state.sessions.remove(req.session_id) {
        tracing::info!("Session {} removed", req.session_id);
        cleanup_work_dir(req.session_id, dir).await;
    }
    Json(RemoveResponse { ok: true })
}

/// Best-effort removal of a session's working directory.
pub async fn cleanup_work_dir(session_id: Uuid, dir: PathBuf) {
    let result = tokio::task::spawn_blocking(move || {
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
        } else {
            Ok(())
        }
    })
    .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Failed to delete working area for {session_id}: {e}"),
        Err(e) => tracing::warn!("Cleanup task failed for {session_id}: {e}"),
    }
}

/// Run the full ingestion pipeline for one session and settle its status.
/// Exactly one ingestion runs per session: the session is created `Cloning`
/// by the handler and only this task transitions it out.
async fn ingest(state: AppState, session_id: Uuid, url: String) -> Result<(), IngestError> {
    let work_dir = state.config.session_dir(&session_id);
    let guard = git::WorkDirGuard::new(work_dir.clone());

    match ingest_inner(&state, &url, &work_dir).await {
        Ok(index) => {
            let chunk_count = index.len();
            state.sessions.mark_ready(session_id, index);
            guard.keep();
            tracing::info!("Session {session_id} ready ({chunk_count} chunks indexed)");
            Ok(())
        }
        Err(e) => {
            // The guard deletes the partial working area when it drops.
            state.sessions.mark_failed(session_id);
            Err(e)
        }
    }
}

async fn ingest_inner(
    state: &AppState,
    url: &str,
    work_dir: &std::path::Path,
) -> Result<VectorIndex, IngestError> {
    // Bound concurrent clones across all sessions
    let _permit = state
        .clone_semaphore
        .acquire()
        .await
        .map_err(|_| IngestError::Internal("clone semaphore closed".to_string()))?;

    let timeout = std::time::Duration::from_secs(state.config.clone_timeout_secs);
    let clone_url = url.to_string();
    let clone_dir = work_dir.to_path_buf();

    let clone_result = tokio::time::timeout(
        timeout,
        tokio::task::spawn_blocking(move || git::clone_shallow(&clone_url, &clone_dir)),
    )
    .await;

    match clone_result {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => return Err(e.into()),
        Ok(Err(e)) => return Err(IngestError::Internal(format!("clone task failed: {e}"))),
        Err(_) => {
            return Err(FetchError::Timeout(state.config.clone_timeout_secs).into());
        }
    }

    // Size ceiling, checked after the shallow clone lands
    let size_dir = work_dir.to_path_buf();
    let repo_size = tokio::task::spawn_blocking(move || git::dir_size_bytes(&size_dir))
        .await
        .map_err(|e| IngestError::Internal(format!("size check failed: {e}")))?;
    let max_bytes = state.config.max_repo_size_mb * 1024 * 1024;
    if repo_size > max_bytes {
        return Err(FetchError::TooLarge {
            size_mb: repo_size / (1024 * 1024),
            limit_mb: state.config.max_repo_size_mb,
        }
        .into());
    }

    // Walk and chunk
    let walk_dir = work_dir.to_path_buf();
    let files = tokio::task::spawn_blocking(move || git::walk_source_files(&walk_dir))
        .await
        .map_err(|e| IngestError::Internal(format!("walk task failed: {e}")))?;
    tracing::info!("Found {} indexable files in {url}", files.len());

    let chunks = chunk_source_files(&files, &ChunkParams::default());
    tracing::info!("Created {} chunks for {url}", chunks.len());

    // Embed and build the index; all-or-nothing
    let index = build_index(&state.http_client, &state.config.llm, chunks).await?;
    Ok(index)
}

fn error_response(e: &IngestError) -> (StatusCode, Json<ErrorResponse>) {
    (
        e.status(),
        Json(ErrorResponse {
            error: e.public_message().to_string(),
        }),
    )
}
