//! Per-session vector index: all-or-nothing build over a session's chunks,
//! cosine-similarity search over their embeddings.

use crate::config::LlmConfig;
use crate::error::IndexError;
use crate::llm::embeddings;
use crate::models::Chunk;

/// A chunk together with its embedding vector.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A search result with its cosine similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Immutable similarity index owned by exactly one session.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<EmbeddedChunk>,
    dim: usize,
}

impl VectorIndex {
    /// Assemble an index from pre-embedded chunks. Used directly by tests;
    /// production goes through [`build_index`].
    pub fn from_entries(entries: Vec<EmbeddedChunk>) -> Self {
        let dim = entries.first().map(|e| e.embedding.len()).unwrap_or(0);
        Self { entries, dim }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Top-k chunks by descending cosine similarity, ties broken by
    /// ascending chunk id. Returns `min(k, len)` results; never mutates.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(f32, &EmbeddedChunk)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.chunk.id.cmp(&b.1.chunk.id))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(score, e)| ScoredChunk {
                chunk: e.chunk.clone(),
                score,
            })
            .collect()
    }
}

/// Embed every chunk and build the index. Any embedding failure fails the
/// whole build: a partially embedded index is never exposed to queries.
pub async fn build_index(
    client: &reqwest::Client,
    llm: &LlmConfig,
    chunks: Vec<Chunk>,
) -> Result<VectorIndex, IndexError> {
    if chunks.is_empty() {
        return Err(IndexError::EmptyRepository);
    }

    // Prepend the file path so the embedding carries location context.
    let texts: Vec<String> = chunks
        .iter()
        .map(|c| format!("File: {}\n{}", c.file_path, c.text))
        .collect();

    let vectors = embeddings::embed_batch(client, llm, &texts)
        .await
        .map_err(|e| IndexError::EmbeddingUnavailable(format!("{e:#}")))?;

    if vectors.len() != chunks.len() {
        return Err(IndexError::EmbeddingUnavailable(format!(
            "expected {} embeddings, got {}",
            chunks.len(),
            vectors.len()
        )));
    }

    let expected_dim = expected_dimension(&vectors, llm.embedding_dim)?;
    for vector in &vectors {
        if vector.len() != expected_dim {
            return Err(IndexError::DimensionMismatch {
                expected: expected_dim,
                got: vector.len(),
            });
        }
    }

    let entries = chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
        .collect();

    Ok(VectorIndex::from_entries(entries))
}

/// Dimension every embedding in the batch must have. When `configured` is
/// non-zero the provider's vectors must match it; zero defers to whatever the
/// model returns.
fn expected_dimension(vectors: &[Vec<f32>], configured: usize) -> Result<usize, IndexError> {
    let observed = vectors
        .first()
        .map(|v| v.len())
        .filter(|d| *d > 0)
        .ok_or(IndexError::EmptyRepository)?;
    if configured > 0 && observed != configured {
        return Err(IndexError::DimensionMismatch {
            expected: configured,
            got: observed,
        });
    }
    Ok(observed)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
