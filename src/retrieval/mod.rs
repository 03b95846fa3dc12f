//! Hybrid retrieval: lexical + vector search, rank fusion, reranking
//!
//! The public entry point is the `PassageRetriever` trait with two
//! implementations chosen once at construction: `HybridRetriever` (BM25 and
//! vector search fused by RRF, then cross-encoder reranked) and
//! `VectorRetriever` (plain semantic top-k).

mod fusion;
mod hybrid;
mod rerank;
mod vector;

pub use fusion::{reciprocal_rank_fusion, FusedCandidate, FusionConfig};
pub use hybrid::{build_retriever, HybridRetriever, PassageRetriever, VectorRetriever};
pub use rerank::{FastEmbedReranker, RerankError, RerankModel, Reranker};
pub use vector::{VectorSearch, VectorSearchError};

use crate::corpus::Passage;

/// Final output unit: a passage with its relevance score
///
/// The score is the cross-encoder's when reranking succeeded, the fused RRF
/// score when the pipeline fell back, or a rank-derived score from the plain
/// vector strategy. Only the ordering is part of the contract.
#[derive(Debug, Clone)]
pub struct RankedPassage {
    pub passage: Passage,
    pub score: f32,
}
