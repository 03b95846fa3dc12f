//! Vector search adapter seam
//!
//! Semantic nearest-neighbor search is an externally maintained capability,
//! not reimplemented here. The adapter only guarantees ordering (rank 1 =
//! most similar) and passage identity compatible with the lexical corpus.

use async_trait::async_trait;
use thiserror::Error;

use crate::corpus::Passage;

#[derive(Error, Debug)]
pub enum VectorSearchError {
    #[error("Vector index unavailable: {0}")]
    Unavailable(String),

    #[error("Vector search failed: {0}")]
    Backend(String),
}

/// Interface to a pre-built semantic embedding index
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Up to `k` passages ranked by semantic similarity to `query`
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<Passage>, VectorSearchError>;
}
