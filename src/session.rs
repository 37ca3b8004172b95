//! Session registry: maps opaque session ids to working areas, indexes and
//! conversation history, and enforces the status gate between ingestion and
//! queries.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::QueryError;
use crate::index::VectorIndex;
use crate::models::{ChatTurn, SessionStatus};

/// Conversation turns kept per session (oldest dropped first).
const MAX_HISTORY_TURNS: usize = 10;

/// Server-side context for one cloned repository.
pub struct Session {
    pub id: Uuid,
    pub repo_url: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub work_dir: PathBuf,
    /// Present only once the session is `Ready`. Shared so queries can search
    /// without holding the registry lock.
    pub index: Option<Arc<VectorIndex>>,
    pub history: Vec<ChatTurn>,
}

/// Registry of all live sessions. Ids are UUID v4 and never reused; a removed
/// id resolves to `NotFound` forever after.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session in `Cloning` state and return its id. The
    /// working directory is namespaced under `sessions_root` by the fresh id,
    /// so two sessions can never collide on disk.
    pub fn register(&self, repo_url: &str, sessions_root: &std::path::Path) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let session = Session {
            id,
            repo_url: repo_url.to_string(),
            status: SessionStatus::Cloning,
            created_at: now,
            last_active: now,
            work_dir: sessions_root.join(id.to_string()),
            index: None,
            history: Vec::new(),
        };
        self.sessions.write().insert(id, session);
        id
    }

    /// Transition a session to `Ready` with its freshly built index.
    pub fn mark_ready(&self, id: Uuid, index: VectorIndex) {
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get_mut(&id) {
            session.status = SessionStatus::Ready;
            session.index = Some(Arc::new(index));
            session.last_active = Utc::now();
        }
    }

    /// Transition a session to `Failed`. The index stays absent.
    pub fn mark_failed(&self, id: Uuid) {
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get_mut(&id) {
            session.status = SessionStatus::Failed;
            session.index = None;
        }
    }

    pub fn status(&self, id: Uuid) -> Option<SessionStatus> {
        self.sessions.read().get(&id).map(|s| s.status.clone())
    }

    /// Fetch the index of a `Ready` session, refreshing its activity clock.
    /// `Cloning` sessions fail fast with `NotReady`; a query never waits on
    /// an ingestion in progress.
    pub fn ready_index(&self, id: Uuid) -> Result<Arc<VectorIndex>, QueryError> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&id).ok_or(QueryError::NotFound)?;
        match session.status {
            SessionStatus::Ready => {}
            SessionStatus::Cloning => return Err(QueryError::NotReady),
            SessionStatus::Failed => return Err(QueryError::NotFound),
        }
        session.last_active = Utc::now();
        session
            .index
            .clone()
            .ok_or(QueryError::NotReady)
    }

    /// Snapshot of a session's conversation history.
    pub fn history(&self, id: Uuid) -> Vec<ChatTurn> {
        self.sessions
            .read()
            .get(&id)
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    /// Record one question/answer exchange, dropping the oldest turns past
    /// the cap. A session removed mid-query is silently skipped.
    pub fn append_exchange(&self, id: Uuid, question: &str, answer: &str) {
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get_mut(&id) {
            session.history.push(ChatTurn {
                role: "user".to_string(),
                content: question.to_string(),
            });
            session.history.push(ChatTurn {
                role: "assistant".to_string(),
                content: answer.to_string(),
            });
            let excess = session.history.len().saturating_sub(MAX_HISTORY_TURNS);
            if excess > 0 {
                session.history.drain(..excess);
            }
            session.last_active = Utc::now();
        }
    }

    /// Remove a session, returning its working directory for cleanup.
    /// Idempotent: removing an unknown or already-removed id is a no-op.
    pub fn remove(&self, id: Uuid) -> Option<PathBuf> {
        self.sessions.write().remove(&id).map(|s| s.work_dir)
    }

    /// Evict sessions idle longer than `idle_timeout`, returning their ids
    /// and working directories. Filesystem cleanup happens at the caller so
    /// one session's failure cannot block the rest of the sweep.
    pub fn expire_stale(&self, now: DateTime<Utc>, idle_timeout: Duration) -> Vec<(Uuid, PathBuf)> {
        let mut sessions = self.sessions.write();
        let stale: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, s)| {
                // Never evict a session mid-ingestion; the clone timeout
                // bounds how long it can stay in Cloning.
                s.status != SessionStatus::Cloning && now - s.last_active > idle_timeout
            })
            .map(|(id, _)| *id)
            .collect();

        stale
            .into_iter()
            .filter_map(|id| sessions.remove(&id).map(|s| (id, s.work_dir)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::EmbeddedChunk;
    use crate::models::Chunk;
    use std::path::Path;

    fn tiny_index() -> VectorIndex {
        let chunk = Chunk {
            id: 0,
            file_path: "README.md".to_string(),
            start_line: 1,
            end_line: 1,
            text: "hello".to_string(),
            language: "text".to_string(),
        };
        VectorIndex::from_entries(vec![EmbeddedChunk {
            chunk,
            embedding: vec![1.0, 0.0],
        }])
    }

    #[test]
    fn test_register_starts_in_cloning() {
        let registry = SessionRegistry::new();
        let id = registry.register("https://example.com/r.git", Path::new("/tmp"));
        assert_eq!(registry.status(id), Some(SessionStatus::Cloning));
    }

    #[test]
    fn test_ids_are_distinct_for_same_url() {
        let registry = SessionRegistry::new();
        let a = registry.register("https://example.com/r.git", Path::new("/tmp"));
        let b = registry.register("https://example.com/r.git", Path::new("/tmp"));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_query_during_cloning_is_not_ready() {
        let registry = SessionRegistry::new();
        let id = registry.register("https://example.com/r.git", Path::new("/tmp"));
        match registry.ready_index(id) {
            Err(QueryError::NotReady) => {}
            other => panic!("expected NotReady, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        let registry = SessionRegistry::new();
        match registry.ready_index(Uuid::new_v4()) {
            Err(QueryError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_ready_session_serves_index() {
        let registry = SessionRegistry::new();
        let id = registry.register("https://example.com/r.git", Path::new("/tmp"));
        registry.mark_ready(id, tiny_index());
        let index = registry.ready_index(id).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_failed_session_is_not_found() {
        let registry = SessionRegistry::new();
        let id = registry.register("https://example.com/r.git", Path::new("/tmp"));
        registry.mark_failed(id);
        match registry.ready_index(id) {
            Err(QueryError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SessionRegistry::new();
        let id = registry.register("https://example.com/r.git", Path::new("/tmp"));
        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none()); // second remove: no-op
        assert!(registry.remove(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_removed_session_queries_are_not_found() {
        let registry = SessionRegistry::new();
        let id = registry.register("https://example.com/r.git", Path::new("/tmp"));
        registry.mark_ready(id, tiny_index());
        registry.remove(id);
        match registry.ready_index(id) {
            Err(QueryError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_history_caps_turns() {
        let registry = SessionRegistry::new();
        let id = registry.register("https://example.com/r.git", Path::new("/tmp"));
        for i in 0..8 {
            registry.append_exchange(id, &format!("q{i}"), &format!("a{i}"));
        }
        let history = registry.history(id);
        assert_eq!(history.len(), MAX_HISTORY_TURNS);
        // Oldest turns dropped, latest kept
        assert_eq!(history.last().unwrap().content, "a7");
        assert_eq!(history[0].content, "q3");
    }

    #[test]
    fn test_expire_stale_skips_active_and_cloning() {
        let registry = SessionRegistry::new();
        let idle = registry.register("https://example.com/a.git", Path::new("/tmp"));
        registry.mark_ready(idle, tiny_index());
        let cloning = registry.register("https://example.com/b.git", Path::new("/tmp"));

        // Everything is fresh: nothing expires
        let evicted = registry.expire_stale(Utc::now(), Duration::seconds(3600));
        assert!(evicted.is_empty());

        // Far future: the ready session expires, the cloning one survives
        let later = Utc::now() + Duration::seconds(7200);
        let evicted = registry.expire_stale(later, Duration::seconds(3600));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].0, idle);
        assert_eq!(registry.status(cloning), Some(SessionStatus::Cloning));
    }

    #[test]
    fn test_query_refreshes_activity_clock() {
        let registry = SessionRegistry::new();
        let id = registry.register("https://example.com/r.git", Path::new("/tmp"));
        registry.mark_ready(id, tiny_index());
        let before = Utc::now();
        registry.ready_index(id).unwrap();
        let last_active = registry.sessions.read().get(&id).unwrap().last_active;
        assert!(last_active >= before);
    }
}
