//! Persistence for the lexical index and its backing corpus
//!
//! One artifact per index: zstd-compressed JSON holding the artifact
//! version, the corpus fingerprint, the BM25 statistics and the corpus
//! snapshot itself. Saves are atomic (temp file, fsync, rename). Loads are
//! best-effort: anything unusable - missing, unreadable, wrong version,
//! fingerprint mismatch - yields `None` and a log line, never an error, so
//! a cold start simply runs with lexical search disabled.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, Passage};
use crate::lexical::Bm25Index;

/// Bumped whenever the artifact layout changes; older artifacts are
/// treated as absent and must be rebuilt.
pub const ARTIFACT_VERSION: u32 = 1;

const ZSTD_LEVEL: i32 = 3;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Index store IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    #[error("Index artifact encoding failed: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Invalid index path: {0}")]
    InvalidPath(PathBuf),
}

fn io_err(source: std::io::Error, context: impl Into<String>) -> StoreError {
    StoreError::Io {
        source,
        context: context.into(),
    }
}

#[derive(Serialize)]
struct ArtifactRef<'a> {
    version: u32,
    corpus_fingerprint: &'a str,
    stats: &'a Bm25Index,
    passages: &'a [Passage],
}

#[derive(Deserialize)]
struct ArtifactOwned {
    version: u32,
    corpus_fingerprint: String,
    stats: Bm25Index,
    passages: Vec<Passage>,
}

/// An in-memory lexical index paired with the corpus snapshot it was
/// built from. Queries read the snapshot; rebuilds swap the whole thing.
#[derive(Debug, Clone)]
pub struct LexicalSnapshot {
    pub index: Bm25Index,
    pub corpus: Corpus,
    fingerprint: String,
}

impl LexicalSnapshot {
    pub fn new(index: Bm25Index, corpus: Corpus) -> Self {
        let fingerprint = corpus.fingerprint();
        Self {
            index,
            corpus,
            fingerprint,
        }
    }

    /// Fingerprint of the corpus this index was built over; compare against
    /// a live corpus to detect a stale lexical index.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Reads and writes the single index artifact at a fixed path
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the index and corpus, overwriting atomically
    pub fn save(&self, index: Bm25Index, corpus: Corpus) -> Result<LexicalSnapshot, StoreError> {
        let fingerprint = corpus.fingerprint();
        let artifact = ArtifactRef {
            version: ARTIFACT_VERSION,
            corpus_fingerprint: &fingerprint,
            stats: &index,
            passages: corpus.passages(),
        };

        let json = serde_json::to_vec(&artifact)?;
        let compressed = zstd::encode_all(&json[..], ZSTD_LEVEL)
            .map_err(|e| io_err(e, "Failed to compress index artifact"))?;

        let parent = self
            .path
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(self.path.clone()))?;
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                io_err(e, format!("Failed to create index directory: {}", parent.display()))
            })?;
        }

        // Write to a temp file first, then rename into place.
        let temp_path = self.path.with_extension("idx.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| {
            io_err(e, format!("Failed to create temp artifact: {}", temp_path.display()))
        })?;
        file.write_all(&compressed).map_err(|e| {
            io_err(e, format!("Failed to write artifact: {}", temp_path.display()))
        })?;
        file.sync_all().map_err(|e| {
            io_err(e, format!("Failed to sync artifact: {}", temp_path.display()))
        })?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| {
            io_err(
                e,
                format!(
                    "Failed to rename artifact into place: {} -> {}",
                    temp_path.display(),
                    self.path.display()
                ),
            )
        })?;

        tracing::info!(
            path = %self.path.display(),
            passages = corpus.len(),
            "lexical index persisted"
        );

        Ok(LexicalSnapshot {
            index,
            corpus,
            fingerprint,
        })
    }

    /// Best-effort load of the persisted snapshot
    pub fn load(&self) -> Option<LexicalSnapshot> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no index artifact, cold start");
            return None;
        }

        let compressed = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable index artifact, treating as absent");
                return None;
            }
        };

        let json = match zstd::decode_all(&compressed[..]) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "corrupt index artifact, treating as absent");
                return None;
            }
        };

        let artifact: ArtifactOwned = match serde_json::from_slice(&json) {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "malformed index artifact, treating as absent");
                return None;
            }
        };

        if artifact.version != ARTIFACT_VERSION {
            tracing::warn!(
                path = %self.path.display(),
                found = artifact.version,
                expected = ARTIFACT_VERSION,
                "index artifact version mismatch, rebuild required"
            );
            return None;
        }

        let corpus = Corpus::from_passages(artifact.passages);
        let fingerprint = corpus.fingerprint();
        if fingerprint != artifact.corpus_fingerprint {
            tracing::warn!(
                path = %self.path.display(),
                "index artifact fingerprint mismatch, rebuild required"
            );
            return None;
        }

        tracing::info!(
            path = %self.path.display(),
            passages = corpus.len(),
            "lexical index loaded"
        );

        Some(LexicalSnapshot {
            index: artifact.stats,
            corpus,
            fingerprint,
        })
    }
}
