//! Reciprocal Rank Fusion for combining lexical and vector rankings

use ahash::AHashMap;
use std::collections::hash_map::Entry;

use crate::corpus::Passage;

/// Configuration for one fusion pass
#[derive(Debug, Clone, Copy)]
pub struct FusionConfig {
    /// RRF K constant (typically 60)
    pub k_rrf: f32,

    /// How many fused candidates to hand to the reranker
    pub rerank_top_n: usize,
}

/// A passage with its summed RRF score; transient, one query's lifetime
#[derive(Debug, Clone)]
pub struct FusedCandidate {
    pub passage: Passage,
    pub score: f32,
}

/// Merge two ranked lists with Reciprocal Rank Fusion
///
/// Each list contributes `1 / (k_rrf + rank)` per passage, 1-based ranks; a
/// passage present in both lists accumulates both contributions. The join
/// key is the corpus ordinal. Output is sorted by fused score descending
/// with ties broken by first appearance (the lexical list is scanned
/// first), then truncated to `rerank_top_n`.
pub fn reciprocal_rank_fusion(
    lexical_ranked: Vec<Passage>,
    vector_ranked: Vec<Passage>,
    config: &FusionConfig,
) -> Vec<FusedCandidate> {
    let mut candidates: Vec<FusedCandidate> = Vec::new();
    let mut seen: AHashMap<u32, usize> = AHashMap::new();

    for list in [lexical_ranked, vector_ranked] {
        for (position, passage) in list.into_iter().enumerate() {
            let contribution = 1.0 / (config.k_rrf + position as f32 + 1.0);
            match seen.entry(passage.id) {
                Entry::Occupied(slot) => {
                    candidates[*slot.get()].score += contribution;
                }
                Entry::Vacant(slot) => {
                    slot.insert(candidates.len());
                    candidates.push(FusedCandidate {
                        passage,
                        score: contribution,
                    });
                }
            }
        }
    }

    // Stable sort: equal scores keep first-seen order.
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(config.rerank_top_n);
    candidates
}
