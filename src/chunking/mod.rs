//! Deterministic chunking: overlapping line-aligned windows bounded by a
//! character budget, with 1-based line spans for provenance.

pub mod window;

pub use window::{chunk_text, ChunkParams, ChunkOutput};

use crate::models::{Chunk, SourceFile};

/// Chunk every source file, assigning session-wide sequential chunk ids.
/// Ids order tie-broken search results, so they must be stable for a given
/// file set and parameters.
pub fn chunk_source_files(files: &[SourceFile], params: &ChunkParams) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut next_id = 0usize;

    for file in files {
        for raw in chunk_text(&file.content, params) {
            chunks.push(Chunk {
                id: next_id,
                file_path: file.relative_path.clone(),
                start_line: raw.start_line,
                end_line: raw.end_line,
                text: raw.content,
                language: file.language.clone(),
            });
            next_id += 1;
        }
    }

    chunks
}
