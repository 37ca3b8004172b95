use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of one session's ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Cloning,
    Ready,
    Failed,
}

/// A text file lifted out of the cloned tree.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub relative_path: String,
    pub content: String,
    pub language: String,
}

/// The unit of retrieval: a bounded span of one source file.
/// `id` is sequential within a session and orders tie-broken search results.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: usize,
    pub file_path: String,
    /// 1-based inclusive line span in the original file.
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    pub language: String,
}

/// One prior exchange in a session's conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Line span of a cited chunk, 1-based inclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
}

/// Provenance reference returned with every answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub path: String,
    pub span: Span,
}

// ─── Wire types ──────────────────────────────────────────

/// POST /clone request
#[derive(Debug, Clone, Deserialize)]
pub struct CloneRequest {
    pub repo_url: String,
}

/// POST /clone success response
#[derive(Debug, Clone, Serialize)]
pub struct CloneResponse {
    pub session_id: Uuid,
}

/// POST /query request
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub session_id: Uuid,
    pub question: String,
}

/// POST /query success response
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Citation>,
}

/// POST /remove request
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveRequest {
    pub session_id: Uuid,
}

/// POST /remove response (idempotent success)
#[derive(Debug, Clone, Serialize)]
pub struct RemoveResponse {
    pub ok: bool,
}

/// GET /status response
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub message: String,
}

/// Generic error body for every failure path.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_serializes_to_snake_case() {
        let json = serde_json::to_value(SessionStatus::Cloning).unwrap();
        assert_eq!(json, "cloning");
    }

    #[test]
    fn test_citation_wire_shape() {
        let citation = Citation {
            path: "README.md".to_string(),
            span: Span {
                start_line: 3,
                end_line: 7,
            },
        };
        let json = serde_json::to_value(&citation).unwrap();
        assert_eq!(json["path"], "README.md");
        assert_eq!(json["span"]["start_line"], 3);
        assert_eq!(json["span"]["end_line"], 7);
    }

    #[test]
    fn test_query_request_deserializes() {
        let body = format!(
            r#"{{"session_id":"{}","question":"what license?"}}"#,
            Uuid::new_v4()
        );
        let req: QueryRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.question, "what license?");
    }
}
