//! Local embedding provider backed by `fastembed` (ONNX Runtime).
//!
//! This module is only available when the `fastembed` feature is enabled.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, error, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Dimensionality of `all-MiniLM-L6-v2`.
const MINILM_DIMENSIONS: usize = 384;

/// An [`EmbeddingProvider`] running `sentence-transformers/all-MiniLM-L6-v2`
/// locally.
///
/// The model is downloaded on first use and cached. Inference is CPU-bound,
/// so calls are moved onto tokio's blocking pool.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::fastembed::FastEmbedProvider;
///
/// let provider = FastEmbedProvider::new()?;
/// let embedding = provider.embed("pad thai").await?;
/// assert_eq!(embedding.len(), 384);
/// ```
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model", &Self::MODEL_NAME)
            .field("dimensions", &MINILM_DIMENSIONS)
            .finish_non_exhaustive()
    }
}

impl FastEmbedProvider {
    const MODEL_NAME: &'static str = "all-MiniLM-L6-v2";

    /// Load the model using fastembed's default cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the model cannot be downloaded or loaded.
    pub fn new() -> Result<Self> {
        Self::with_options(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
    }

    /// Load the model, caching downloaded weights under `cache_dir`.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_cache_dir(cache_dir.into()),
        )
    }

    fn with_options(options: InitOptions) -> Result<Self> {
        info!(model = Self::MODEL_NAME, "loading embedding model");
        let model =
            TextEmbedding::try_new(options.with_show_download_progress(true)).map_err(|e| {
                error!(model = Self::MODEL_NAME, error = %e, "failed to load embedding model");
                RagError::Embedding {
                    provider: "fastembed".into(),
                    message: format!("failed to initialize {}: {e}", Self::MODEL_NAME),
                }
            })?;
        Ok(Self { model: Arc::new(model) })
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::Embedding {
            provider: "fastembed".into(),
            message: "model returned no embedding".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "fastembed", batch_size = texts.len(), "embedding batch");

        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        let embeddings = tokio::task::spawn_blocking(move || model.embed(owned, None))
            .await
            .map_err(|e| RagError::Embedding {
                provider: "fastembed".into(),
                message: format!("embedding task panicked: {e}"),
            })?
            .map_err(|e| {
                error!(provider = "fastembed", error = %e, "embedding failed");
                RagError::Embedding { provider: "fastembed".into(), message: e.to_string() }
            })?;

        if embeddings.len() != texts.len() {
            return Err(RagError::Embedding {
                provider: "fastembed".into(),
                message: format!("expected {} embeddings, got {}", texts.len(), embeddings.len()),
            });
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        MINILM_DIMENSIONS
    }

    fn model_name(&self) -> &str {
        Self::MODEL_NAME
    }
}
