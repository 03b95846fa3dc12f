//! Configuration management for the retrieval pipeline
//!
//! TOML-backed configuration with serde defaults for every recognized
//! option, plus validation that collects all failures instead of stopping
//! at the first.

use crate::error::{Result, RetrieverError, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta", default)]
    pub meta: MetaConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub reranker: RerankerConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            schema_version: "1".to_string(),
            created_at: current_timestamp(),
            last_modified: current_timestamp(),
        }
    }
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Location of the persisted lexical index artifact
    pub index_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            index_path: base.join("rankfuse").join("lexical.idx"),
        }
    }
}

/// Which retriever to construct; decided once, not per call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Lexical + vector with fusion and reranking
    Hybrid,
    /// Plain vector top-k
    Vector,
}

/// Retrieval pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_strategy")]
    pub strategy: Strategy,

    /// Per-modality fetch size
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Fusion output size handed to the reranker; defaults to `top_k`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank_top_n: Option<usize>,

    /// Final result size
    #[serde(default = "default_final_top_k")]
    pub final_top_k: usize,

    /// RRF constant
    #[serde(default = "default_k_rrf")]
    pub k_rrf: f32,

    /// BM25 term-frequency saturation
    #[serde(default = "default_bm25_k1")]
    pub bm25_k1: f32,

    /// BM25 length normalization
    #[serde(default = "default_bm25_b")]
    pub bm25_b: f32,

    /// Timeout for one vector adapter call
    #[serde(default = "default_vector_timeout_ms")]
    pub vector_timeout_ms: u64,

    /// Total attempts against the vector adapter (1 = no retry)
    #[serde(default = "default_vector_retries")]
    pub vector_retries: u32,

    /// Timeout for one reranker inference call
    #[serde(default = "default_rerank_timeout_ms")]
    pub rerank_timeout_ms: u64,
}

impl RetrievalConfig {
    /// Effective fusion output size
    pub fn rerank_top_n(&self) -> usize {
        self.rerank_top_n.unwrap_or(self.top_k)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            top_k: default_top_k(),
            rerank_top_n: None,
            final_top_k: default_final_top_k(),
            k_rrf: default_k_rrf(),
            bm25_k1: default_bm25_k1(),
            bm25_b: default_bm25_b(),
            vector_timeout_ms: default_vector_timeout_ms(),
            vector_retries: default_vector_retries(),
            rerank_timeout_ms: default_rerank_timeout_ms(),
        }
    }
}

fn default_strategy() -> Strategy {
    Strategy::Hybrid
}
fn default_top_k() -> usize {
    8
}
fn default_final_top_k() -> usize {
    5
}
fn default_k_rrf() -> f32 {
    60.0
}
fn default_bm25_k1() -> f32 {
    1.2
}
fn default_bm25_b() -> f32 {
    0.75
}
fn default_vector_timeout_ms() -> u64 {
    5_000
}
fn default_vector_retries() -> u32 {
    2
}
fn default_rerank_timeout_ms() -> u64 {
    10_000
}

/// Reranker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    /// Cross-encoder model identifier
    pub model: String,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            model: "BAAI/bge-reranker-base".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig::default(),
            storage: StorageConfig::default(),
            retrieval: RetrievalConfig::default(),
            reranker: RerankerConfig::default(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("rankfuse").join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RetrieverError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| RetrieverError::Io {
            source: e,
            context: format!("Failed to read config file: {}", path.display()),
        })?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, the default location, or fall back to
    /// built-in defaults when no file exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::load(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Write configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RetrieverError::Io {
                source: e,
                context: format!("Failed to create config directory: {}", parent.display()),
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| RetrieverError::Io {
            source: e,
            context: format!("Failed to write config file: {}", path.display()),
        })?;
        Ok(())
    }

    /// Validate all settings, collecting every failure
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        let r = &self.retrieval;

        if r.top_k == 0 {
            errors.push(ValidationError::new("retrieval.top_k", "must be at least 1"));
        }
        if r.final_top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.final_top_k",
                "must be at least 1",
            ));
        }
        if r.rerank_top_n == Some(0) {
            errors.push(ValidationError::new(
                "retrieval.rerank_top_n",
                "must be at least 1 when set",
            ));
        }
        if !(r.k_rrf > 0.0) {
            errors.push(ValidationError::new("retrieval.k_rrf", "must be positive"));
        }
        if !(r.bm25_k1 >= 0.0) {
            errors.push(ValidationError::new(
                "retrieval.bm25_k1",
                "must be non-negative",
            ));
        }
        if !(0.0..=1.0).contains(&r.bm25_b) {
            errors.push(ValidationError::new(
                "retrieval.bm25_b",
                "must be within [0, 1]",
            ));
        }
        if r.vector_retries == 0 {
            errors.push(ValidationError::new(
                "retrieval.vector_retries",
                "must be at least 1 (1 = no retry)",
            ));
        }
        if self.reranker.model.trim().is_empty() {
            errors.push(ValidationError::new("reranker.model", "must not be empty"));
        }
        if self.storage.index_path.as_os_str().is_empty() {
            errors.push(ValidationError::new("storage.index_path", "must not be empty"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RetrieverError::ConfigValidation { errors })
        }
    }
}
