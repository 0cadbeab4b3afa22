//! Vector index abstraction for embedded chunks.

use crate::embeddings::cosine_similarity;
use crate::types::IndexedChunk;
use ragcrew_core::AppResult;

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Insert a chunk with its embedding. A chunk with the same source and
    /// position replaces the existing one.
    fn upsert_chunk(&mut self, chunk: IndexedChunk) -> AppResult<()>;

    /// Search for the top-k chunks scoring at least `min_score`.
    ///
    /// Returns chunks ordered by descending similarity score.
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> AppResult<Vec<(IndexedChunk, f32)>>;

    /// Number of indexed chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Brute-force in-memory index. Corpus sizes here are a handful of files,
/// so a linear scan is fine.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    chunks: Vec<IndexedChunk>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorIndex for MemoryIndex {
    fn upsert_chunk(&mut self, chunk: IndexedChunk) -> AppResult<()> {
        match self
            .chunks
            .iter_mut()
            .find(|c| c.source == chunk.source && c.position == chunk.position)
        {
            Some(existing) => *existing = chunk,
            None => self.chunks.push(chunk),
        }
        Ok(())
    }

    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> AppResult<Vec<(IndexedChunk, f32)>> {
        let mut scored: Vec<(&IndexedChunk, f32)> = self
            .chunks
            .iter()
            .map(|c| (c, cosine_similarity(query_embedding, &c.embedding)))
            .filter(|(_, score)| *score >= min_score)
            .collect();

        // Stable sort keeps corpus order for ties.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(c, score)| (c.clone(), score))
            .collect())
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}
