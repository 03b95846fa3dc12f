//! Cross-encoder reranking with a once-initialized shared model
//!
//! The model is expensive to construct, so `Reranker` holds it behind a
//! `tokio::sync::OnceCell`: the first query to need it performs the load,
//! concurrent first queries wait on the same initialization, and afterwards
//! the handle is shared read-only. Inference runs on the blocking pool so
//! the orchestrator can bound it with a timeout.

use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Error, Debug)]
pub enum RerankError {
    #[error("Reranker model load failed: {0}")]
    ModelLoad(String),

    #[error("Reranker inference failed: {0}")]
    Inference(String),
}

/// A joint (query, passage) relevance scorer
pub trait RerankModel: Send + Sync {
    /// One real-valued relevance score per text, in input order
    fn predict(&self, query: &str, texts: &[String]) -> Result<Vec<f32>, RerankError>;
}

/// FastEmbed-backed cross-encoder
pub struct FastEmbedReranker {
    model: TextRerank,
    model_name: String,
}

impl FastEmbedReranker {
    /// Load the cross-encoder by configured name
    pub fn load(model_name: &str) -> Result<Self, RerankError> {
        tracing::info!(model = model_name, "initializing reranker model");

        let init_options = RerankInitOptions::new(Self::resolve(model_name))
            .with_show_download_progress(false);
        let model =
            TextRerank::try_new(init_options).map_err(|e| RerankError::ModelLoad(e.to_string()))?;

        Ok(Self {
            model,
            model_name: model_name.to_string(),
        })
    }

    fn resolve(model_name: &str) -> RerankerModel {
        match model_name {
            "BAAI/bge-reranker-base" => RerankerModel::BGERerankerBase,
            other => {
                tracing::warn!(
                    model = other,
                    "unknown reranker model identifier, using BAAI/bge-reranker-base"
                );
                RerankerModel::BGERerankerBase
            }
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl RerankModel for FastEmbedReranker {
    fn predict(&self, query: &str, texts: &[String]) -> Result<Vec<f32>, RerankError> {
        let documents: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let results = self
            .model
            .rerank(query, documents, true, None)
            .map_err(|e| RerankError::Inference(e.to_string()))?;

        // FastEmbed returns results ranked; map back to input order.
        let mut scores = vec![f32::NEG_INFINITY; texts.len()];
        for result in results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = result.score;
            }
        }
        Ok(scores)
    }
}

type ModelLoader = dyn Fn() -> Result<Arc<dyn RerankModel>, RerankError> + Send + Sync;

/// Lazily-initialized, process-wide reranking resource
pub struct Reranker {
    cell: OnceCell<Arc<dyn RerankModel>>,
    loader: Box<ModelLoader>,
}

impl Reranker {
    /// Rerank with the FastEmbed cross-encoder named in configuration
    pub fn fastembed(model_name: impl Into<String>) -> Self {
        let model_name = model_name.into();
        Self::with_loader(move || {
            FastEmbedReranker::load(&model_name).map(|m| Arc::new(m) as Arc<dyn RerankModel>)
        })
    }

    /// Rerank with a caller-supplied model factory (tests, alternate backends)
    pub fn with_loader(
        loader: impl Fn() -> Result<Arc<dyn RerankModel>, RerankError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    /// Whether the model has been constructed yet
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    async fn model(&self) -> Result<Arc<dyn RerankModel>, RerankError> {
        let model = self
            .cell
            .get_or_try_init(|| async { (self.loader)() })
            .await?;
        Ok(Arc::clone(model))
    }

    /// Score (query, passage) pairs; empty input never touches the model
    pub async fn score(&self, query: &str, texts: Vec<String>) -> Result<Vec<f32>, RerankError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model().await?;
        let query = query.to_string();
        tokio::task::spawn_blocking(move || model.predict(&query, &texts))
            .await
            .map_err(|e| RerankError::Inference(format!("inference task failed: {e}")))?
    }
}
