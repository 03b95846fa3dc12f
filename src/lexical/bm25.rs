//! Okapi BM25 over hand-built inverted postings
//!
//! Scoring uses the "+1" IDF variant, `ln(1 + (N - df + 0.5) / (df + 0.5))`,
//! which stays positive for very frequent terms. Ranking is deterministic:
//! score descending, then corpus ordinal ascending.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::corpus::Corpus;
use crate::lexical::tokenize;

/// BM25 parameters; configuration, never recomputed per query
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f32,
    /// Document-length normalization
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Inverted index over one corpus snapshot
///
/// Serializable in full - postings and statistics travel inside the
/// persisted artifact together with the corpus they were built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Index {
    params: Bm25Params,
    /// term -> (ordinal, term frequency), ordinals ascending
    postings: HashMap<String, Vec<(u32, u32)>>,
    /// per-passage token counts, indexed by ordinal
    doc_len: Vec<u32>,
    avg_doc_len: f32,
}

impl Bm25Index {
    /// Build an index from a corpus snapshot. O(total tokens).
    pub fn build(corpus: &Corpus, params: Bm25Params) -> Self {
        let mut postings: HashMap<String, Vec<(u32, u32)>> = HashMap::new();
        let mut doc_len = Vec::with_capacity(corpus.len());

        for passage in corpus.iter() {
            let terms = tokenize(&passage.text);
            doc_len.push(terms.len() as u32);

            let mut tf: AHashMap<String, u32> = AHashMap::new();
            for term in terms {
                *tf.entry(term).or_insert(0) += 1;
            }
            for (term, count) in tf {
                postings.entry(term).or_default().push((passage.id, count));
            }
        }

        // Passages are visited in ordinal order, but the per-passage term
        // map iterates unordered; keep each posting list sorted by ordinal.
        for list in postings.values_mut() {
            list.sort_unstable_by_key(|&(id, _)| id);
        }

        let total: u64 = doc_len.iter().map(|&l| l as u64).sum();
        let avg_doc_len = if doc_len.is_empty() {
            0.0
        } else {
            total as f32 / doc_len.len() as f32
        };

        Self {
            params,
            postings,
            doc_len,
            avg_doc_len,
        }
    }

    /// Number of passages this index was built over
    pub fn num_docs(&self) -> usize {
        self.doc_len.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_len.is_empty()
    }

    /// Document frequency of a term
    pub fn doc_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, |l| l.len())
    }

    pub fn avg_doc_len(&self) -> f32 {
        self.avg_doc_len
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    fn idf(&self, term: &str) -> f32 {
        let df = self.doc_frequency(term) as f32;
        if df == 0.0 {
            return 0.0;
        }
        let n = self.num_docs() as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// One BM25 score per passage, 0.0 where no query term occurs
    ///
    /// O(sum of posting-list lengths for the query terms).
    pub fn scores(&self, query_terms: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.num_docs()];
        if self.avg_doc_len == 0.0 {
            return scores;
        }

        let Bm25Params { k1, b } = self.params;
        for term in query_terms {
            let Some(list) = self.postings.get(term) else {
                continue;
            };
            let idf = self.idf(term);
            for &(ordinal, tf) in list {
                let tf = tf as f32;
                let len_norm = 1.0 - b + b * self.doc_len[ordinal as usize] as f32 / self.avg_doc_len;
                scores[ordinal as usize] += idf * tf * (k1 + 1.0) / (tf + k1 * len_norm);
            }
        }
        scores
    }

    /// Top-k passages by BM25 score
    ///
    /// Score descending, ties broken by corpus ordinal; zero-score passages
    /// carry no lexical evidence and are skipped.
    pub fn top_k(&self, query_terms: &[String], k: usize) -> Vec<(u32, f32)> {
        if k == 0 {
            return Vec::new();
        }
        let mut ranked: Vec<(u32, f32)> = self
            .scores(query_terms)
            .into_iter()
            .enumerate()
            .filter(|&(_, score)| score > 0.0)
            .map(|(ordinal, score)| (ordinal as u32, score))
            .collect();
        ranked.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }
}
