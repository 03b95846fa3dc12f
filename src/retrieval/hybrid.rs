//! Retrieval orchestration
//!
//! One query moves through LexicalSearch -> VectorSearch -> Fuse -> Rerank.
//! A modality that is unavailable (cold-start lexical index, unreachable or
//! slow vector adapter) contributes an empty list and the pipeline
//! proceeds; lexical-only and vector-only operation are valid modes. Only
//! when both modalities come back empty does the query short-circuit to an
//! empty result before reranking.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::config::{Config, RetrievalConfig, Strategy};
use crate::corpus::{Corpus, Passage};
use crate::error::Result;
use crate::lexical::{tokenize, Bm25Index, Bm25Params, IndexStore, LexicalSnapshot};
use crate::retrieval::{
    reciprocal_rank_fusion, FusedCandidate, FusionConfig, RankedPassage, Reranker, VectorSearch,
};

const VECTOR_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Retrieval strategy seam; the implementation is chosen once at
/// construction, never per call
#[async_trait]
pub trait PassageRetriever: Send + Sync {
    /// Ordered list of at most `final_top_k` passages for a raw query
    async fn retrieve(&self, query: &str) -> Result<Vec<RankedPassage>>;
}

/// Construct the retriever named by configuration
pub fn build_retriever(
    config: &Config,
    vector: Arc<dyn VectorSearch>,
) -> Arc<dyn PassageRetriever> {
    match config.retrieval.strategy {
        Strategy::Hybrid => {
            let store = IndexStore::new(&config.storage.index_path);
            let reranker = Reranker::fastembed(&config.reranker.model);
            Arc::new(HybridRetriever::open(
                store,
                vector,
                reranker,
                config.retrieval.clone(),
            ))
        }
        Strategy::Vector => Arc::new(VectorRetriever::new(vector, config.retrieval.clone())),
    }
}

/// BM25 + vector search, fused by RRF, refined by a cross-encoder
pub struct HybridRetriever {
    lexical: RwLock<Option<LexicalSnapshot>>,
    vector: Arc<dyn VectorSearch>,
    reranker: Reranker,
    store: IndexStore,
    /// Serializes index rebuilds; queries keep reading the last snapshot
    rebuild_lock: Mutex<()>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    /// Create a retriever, loading the persisted lexical snapshot if one is
    /// usable; otherwise lexical search stays disabled until `rebuild`
    pub fn open(
        store: IndexStore,
        vector: Arc<dyn VectorSearch>,
        reranker: Reranker,
        config: RetrievalConfig,
    ) -> Self {
        let snapshot = store.load();
        Self {
            lexical: RwLock::new(snapshot),
            vector,
            reranker,
            store,
            rebuild_lock: Mutex::new(()),
            config,
        }
    }

    /// Create a retriever over an already-built snapshot (tests, embedders)
    pub fn with_snapshot(
        snapshot: Option<LexicalSnapshot>,
        store: IndexStore,
        vector: Arc<dyn VectorSearch>,
        reranker: Reranker,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            lexical: RwLock::new(snapshot),
            vector,
            reranker,
            store,
            rebuild_lock: Mutex::new(()),
            config,
        }
    }

    /// Rebuild the lexical index from a new corpus snapshot
    ///
    /// Rebuilds are serialized behind a dedicated lock; concurrent queries
    /// keep reading the previous snapshot and see the new one only after
    /// the artifact is persisted and the swap completes.
    pub async fn rebuild(&self, corpus: Corpus) -> Result<()> {
        let _guard = self.rebuild_lock.lock().await;

        let params = Bm25Params {
            k1: self.config.bm25_k1,
            b: self.config.bm25_b,
        };
        let index = Bm25Index::build(&corpus, params);
        let snapshot = self.store.save(index, corpus)?;

        *self.lexical.write().await = Some(snapshot);
        Ok(())
    }

    /// Fingerprint of the corpus behind the current lexical snapshot, if any
    pub async fn lexical_fingerprint(&self) -> Option<String> {
        self.lexical
            .read()
            .await
            .as_ref()
            .map(|s| s.fingerprint().to_string())
    }

    async fn lexical_search(&self, query: &str, k: usize) -> Vec<Passage> {
        let guard = self.lexical.read().await;
        let Some(snapshot) = guard.as_ref() else {
            tracing::debug!("lexical index absent, degrading to vector-only");
            return Vec::new();
        };

        let terms = tokenize(query);
        snapshot
            .index
            .top_k(&terms, k)
            .into_iter()
            .filter_map(|(ordinal, _)| snapshot.corpus.get(ordinal).cloned())
            .collect()
    }

    async fn rerank(&self, query: &str, fused: Vec<FusedCandidate>) -> Vec<RankedPassage> {
        if fused.is_empty() {
            return Vec::new();
        }

        let final_top_k = self.config.final_top_k;
        let texts: Vec<String> = fused.iter().map(|c| c.passage.text.clone()).collect();
        let timeout = Duration::from_millis(self.config.rerank_timeout_ms);

        let scores = match tokio::time::timeout(timeout, self.reranker.score(query, texts)).await {
            Ok(Ok(scores)) => scores,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "reranking failed, returning fused order");
                return fused_fallback(fused, final_top_k);
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.rerank_timeout_ms,
                    "reranking timed out, returning fused order"
                );
                return fused_fallback(fused, final_top_k);
            }
        };

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        // Stable sort: equal model scores keep fused rank order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(final_top_k);

        ranked
            .into_iter()
            .map(|(i, score)| RankedPassage {
                passage: fused[i].passage.clone(),
                score,
            })
            .collect()
    }
}

#[async_trait]
impl PassageRetriever for HybridRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<RankedPassage>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let k = self.config.top_k;

        // Independent reads; run them concurrently.
        let (lexical_ranked, vector_ranked) = tokio::join!(
            self.lexical_search(query, k),
            guarded_vector_search(&self.vector, query, k, &self.config),
        );

        if lexical_ranked.is_empty() && vector_ranked.is_empty() {
            tracing::debug!(query, "no candidates from either modality");
            return Ok(Vec::new());
        }

        let fused = reciprocal_rank_fusion(
            lexical_ranked,
            vector_ranked,
            &FusionConfig {
                k_rrf: self.config.k_rrf,
                rerank_top_n: self.config.rerank_top_n(),
            },
        );

        Ok(self.rerank(query, fused).await)
    }
}

/// Plain semantic retrieval: vector top-k, no fusion, no reranking
pub struct VectorRetriever {
    vector: Arc<dyn VectorSearch>,
    config: RetrievalConfig,
}

impl VectorRetriever {
    pub fn new(vector: Arc<dyn VectorSearch>, config: RetrievalConfig) -> Self {
        Self { vector, config }
    }
}

#[async_trait]
impl PassageRetriever for VectorRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<RankedPassage>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let passages =
            guarded_vector_search(&self.vector, query, self.config.final_top_k, &self.config).await;

        Ok(passages
            .into_iter()
            .enumerate()
            .map(|(position, passage)| RankedPassage {
                // The adapter only guarantees ordering; derive a score from rank.
                score: 1.0 / (position as f32 + 1.0),
                passage,
            })
            .collect())
    }
}

/// Vector adapter call with bounded timeout and retry
///
/// Unavailability degrades to an empty list; the caller decides what an
/// empty modality means.
async fn guarded_vector_search(
    vector: &Arc<dyn VectorSearch>,
    query: &str,
    k: usize,
    config: &RetrievalConfig,
) -> Vec<Passage> {
    let timeout = Duration::from_millis(config.vector_timeout_ms);
    let attempts = config.vector_retries.max(1);

    for attempt in 1..=attempts {
        match tokio::time::timeout(timeout, vector.similarity_search(query, k)).await {
            Ok(Ok(passages)) => return passages,
            Ok(Err(e)) => {
                tracing::warn!(attempt, error = %e, "vector search failed");
            }
            Err(_) => {
                tracing::warn!(
                    attempt,
                    timeout_ms = config.vector_timeout_ms,
                    "vector search timed out"
                );
            }
        }
        if attempt < attempts {
            tokio::time::sleep(VECTOR_RETRY_BACKOFF).await;
        }
    }

    tracing::warn!("vector modality unavailable, degrading to lexical-only");
    Vec::new()
}

fn fused_fallback(fused: Vec<FusedCandidate>, final_top_k: usize) -> Vec<RankedPassage> {
    fused
        .into_iter()
        .take(final_top_k)
        .map(|c| RankedPassage {
            passage: c.passage,
            score: c.score,
        })
        .collect()
}
