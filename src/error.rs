//! Typed error taxonomy for the ingestion and query pipelines.
//!
//! Handlers surface a generic user-facing message while the typed reason is
//! logged; query-time errors never touch a session's index.

use axum::http::StatusCode;
use thiserror::Error;

/// Failures while fetching a remote repository into a working area.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid repository URL: {0}")]
    InvalidUrl(String),
    #[error("repository not found")]
    NotFound,
    #[error("repository requires authentication")]
    AuthRequired,
    #[error("repository exceeds size limit ({size_mb} MB > {limit_mb} MB)")]
    TooLarge { size_mb: u64, limit_mb: u64 },
    #[error("clone timed out after {0}s")]
    Timeout(u64),
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

/// Failures while building a session's vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding model unavailable: {0}")]
    EmbeddingUnavailable(String),
    #[error("repository contains no indexable content")]
    EmptyRepository,
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Umbrella for everything that can abort the clone→index pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("ingestion task failed: {0}")]
    Internal(String),
}

impl IngestError {
    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::Fetch(FetchError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            IngestError::Fetch(FetchError::NotFound) => StatusCode::NOT_FOUND,
            IngestError::Fetch(FetchError::AuthRequired) => StatusCode::BAD_REQUEST,
            IngestError::Fetch(FetchError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            IngestError::Fetch(FetchError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            IngestError::Fetch(FetchError::Git(_)) => StatusCode::BAD_GATEWAY,
            IngestError::Index(IndexError::EmptyRepository) => StatusCode::UNPROCESSABLE_ENTITY,
            IngestError::Index(_) => StatusCode::BAD_GATEWAY,
            IngestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            IngestError::Fetch(FetchError::InvalidUrl(_)) => {
                "Invalid repository URL: only public https:// Git URLs are supported"
            }
            IngestError::Fetch(FetchError::NotFound) => "Repository not found",
            IngestError::Fetch(FetchError::AuthRequired) => {
                "Repository requires authentication and cannot be cloned"
            }
            IngestError::Fetch(FetchError::TooLarge { .. }) => "Repository exceeds the size limit",
            IngestError::Fetch(FetchError::Timeout(_)) => "Cloning the repository timed out",
            IngestError::Fetch(FetchError::Git(_)) => "Failed to clone the repository",
            IngestError::Index(IndexError::EmptyRepository) => {
                "Repository contains no indexable text files"
            }
            IngestError::Index(_) => "Failed to index the repository",
            IngestError::Internal(_) => "Internal error while preparing the repository",
        }
    }
}

/// Failures while answering a query against a session.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("session not found")]
    NotFound,
    #[error("session is not ready for queries")]
    NotReady,
    #[error("question is empty")]
    EmptyQuestion,
    #[error("generation model unavailable: {0}")]
    GenerationUnavailable(String),
    #[error("question exceeds the prompt context budget")]
    ContextTooLarge,
}

impl QueryError {
    /// HTTP status for the façade. The body stays a generic error string.
    pub fn status(&self) -> StatusCode {
        match self {
            QueryError::NotFound => StatusCode::NOT_FOUND,
            QueryError::NotReady => StatusCode::CONFLICT,
            QueryError::EmptyQuestion => StatusCode::BAD_REQUEST,
            QueryError::GenerationUnavailable(_) => StatusCode::BAD_GATEWAY,
            QueryError::ContextTooLarge => StatusCode::BAD_REQUEST,
        }
    }

    /// User-facing message. Deliberately coarse: provider details stay in logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            QueryError::NotFound => "Session not found",
            QueryError::NotReady => "Session is still being prepared, try again shortly",
            QueryError::EmptyQuestion => "Question is required",
            QueryError::GenerationUnavailable(_) => "Answer generation is unavailable",
            QueryError::ContextTooLarge => "Question is too large",
        }
    }
}
