//! Integration tests for the ingestion and retrieval pipeline.
//!
//! These exercise the walk → chunk → index → retrieve flow and the session
//! lifecycle without requiring a running LLM: embeddings are synthesized.

use std::path::Path;

use repo_qa::chunking::{chunk_source_files, ChunkParams};
use repo_qa::error::QueryError;
use repo_qa::git::walk_source_files;
use repo_qa::index::{EmbeddedChunk, VectorIndex};
use repo_qa::models::{Chunk, SessionStatus};
use repo_qa::session::SessionRegistry;
use uuid::Uuid;

/// Write a tiny repository tree to disk.
fn write_tiny_repo(root: &Path) {
    std::fs::write(
        root.join("README.md"),
        "# tiny-repo\n\nThe project is licensed under MIT.\n",
    )
    .unwrap();
    std::fs::create_dir(root.join("src")).unwrap();
    std::fs::write(
        root.join("src/main.rs"),
        "fn main() {\n    println!(\"hello\");\n}\n",
    )
    .unwrap();
}

/// Deterministic fake embedding: direction depends on which keyword the
/// chunk mentions, so similarity search behaves like a real model would.
fn fake_embed(text: &str) -> Vec<f32> {
    let license = if text.contains("licensed") { 1.0 } else { 0.0 };
    let code = if text.contains("fn main") { 1.0 } else { 0.0 };
    let other = if license == 0.0 && code == 0.0 { 1.0 } else { 0.1 };
    vec![license, code, other]
}

fn index_repo(root: &Path) -> VectorIndex {
    let files = walk_source_files(root);
    let chunks = chunk_source_files(&files, &ChunkParams::default());
    let entries: Vec<EmbeddedChunk> = chunks
        .into_iter()
        .map(|chunk| EmbeddedChunk {
            embedding: fake_embed(&chunk.text),
            chunk,
        })
        .collect();
    VectorIndex::from_entries(entries)
}

#[test]
fn test_walk_chunk_index_retrieve_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_repo(dir.path());

    let index = index_repo(dir.path());
    assert!(index.len() >= 2);

    // Query in the "license" direction: the README chunk must rank first and
    // its citation span must cover the license sentence (line 3).
    let results = index.search(&[1.0, 0.0, 0.0], 3);
    let top = &results[0];
    assert_eq!(top.chunk.file_path, "README.md");
    assert!(top.chunk.start_line <= 3 && 3 <= top.chunk.end_line);
    assert!(top.chunk.text.contains("MIT"));
}

#[test]
fn test_chunk_boundaries_are_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_repo(dir.path());

    let params = ChunkParams::default();
    let first: Vec<Chunk> = chunk_source_files(&walk_source_files(dir.path()), &params);
    let second: Vec<Chunk> = chunk_source_files(&walk_source_files(dir.path()), &params);
    assert_eq!(first, second);
}

#[test]
fn test_session_lifecycle_clone_query_remove() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_repo(dir.path());
    let registry = SessionRegistry::new();

    let id = registry.register("https://example.com/tiny-repo.git", dir.path());
    assert_eq!(registry.status(id), Some(SessionStatus::Cloning));

    // Query before ingestion completes: NotReady, immediately
    assert!(matches!(registry.ready_index(id), Err(QueryError::NotReady)));

    registry.mark_ready(id, index_repo(dir.path()));
    let index = registry.ready_index(id).unwrap();
    assert!(!index.is_empty());

    // First remove releases the session, second is a no-op success
    assert!(registry.remove(id).is_some());
    assert!(registry.remove(id).is_none());
    assert!(matches!(registry.ready_index(id), Err(QueryError::NotFound)));
}

#[test]
fn test_two_sessions_of_same_repo_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_repo(dir.path());
    let registry = SessionRegistry::new();
    let url = "https://example.com/tiny-repo.git";

    let a = registry.register(url, dir.path());
    let b = registry.register(url, dir.path());
    assert_ne!(a, b);

    registry.mark_ready(a, index_repo(dir.path()));
    registry.mark_ready(b, index_repo(dir.path()));

    // Removing one session leaves the other fully queryable
    registry.remove(a);
    let index_b = registry.ready_index(b).unwrap();
    let results = index_b.search(&[1.0, 0.0, 0.0], 1);
    assert_eq!(results[0].chunk.file_path, "README.md");
    assert!(matches!(registry.ready_index(a), Err(QueryError::NotFound)));
}

#[test]
fn test_unknown_session_query_is_not_found() {
    let registry = SessionRegistry::new();
    assert!(matches!(
        registry.ready_index(Uuid::new_v4()),
        Err(QueryError::NotFound)
    ));
}

#[test]
fn test_failed_ingestion_leaves_no_queryable_index() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SessionRegistry::new();
    let id = registry.register("https://example.com/broken.git", dir.path());
    registry.mark_failed(id);
    assert_eq!(registry.status(id), Some(SessionStatus::Failed));
    assert!(matches!(registry.ready_index(id), Err(QueryError::NotFound)));
}

#[test]
fn test_concurrent_queries_on_one_ready_session() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_repo(dir.path());
    let registry = std::sync::Arc::new(SessionRegistry::new());
    let id = registry.register("https://example.com/tiny-repo.git", dir.path());
    registry.mark_ready(id, index_repo(dir.path()));

    // Two questions with different similarity directions, in parallel; each
    // must get its own citations back uncorrupted.
    let r1 = registry.clone();
    let t1 = std::thread::spawn(move || {
        let index = r1.ready_index(id).unwrap();
        index.search(&[1.0, 0.0, 0.0], 1)
    });
    let r2 = registry.clone();
    let t2 = std::thread::spawn(move || {
        let index = r2.ready_index(id).unwrap();
        index.search(&[0.0, 1.0, 0.0], 1)
    });

    let license_hits = t1.join().unwrap();
    let code_hits = t2.join().unwrap();
    assert_eq!(license_hits[0].chunk.file_path, "README.md");
    assert_eq!(code_hits[0].chunk.file_path, "src/main.rs");
}

#[test]
fn test_expired_session_is_swept_but_fresh_one_survives() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_repo(dir.path());
    let registry = SessionRegistry::new();

    let stale = registry.register("https://example.com/a.git", dir.path());
    registry.mark_ready(stale, index_repo(dir.path()));
    // Still mid-ingestion: exempt from the sweep regardless of age
    let cloning = registry.register("https://example.com/b.git", dir.path());

    let later = chrono::Utc::now() + chrono::Duration::seconds(10_000);
    let evicted = registry.expire_stale(later, chrono::Duration::seconds(3600));
    let evicted_ids: Vec<Uuid> = evicted.iter().map(|(id, _)| *id).collect();
    assert!(evicted_ids.contains(&stale));
    assert!(!evicted_ids.contains(&cloning));
    assert_eq!(registry.status(cloning), Some(SessionStatus::Cloning));
}
