//! Ingestion and retrieval orchestrator.
//!
//! The [`RagPipeline`] coordinates the write path (fetch → extract → chunk →
//! embed → store) and the read path (embed → search) by composing a
//! [`DocumentSource`], a [`TextExtractor`], a [`Chunker`], an
//! [`EmbeddingProvider`] and a [`VectorStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use pdfqa_rag::{RagPipeline, RagConfig, InMemoryVectorStore};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! pipeline.ensure_populated().await?;
//! let matches = pipeline.search("how hot is green curry?", 3).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::chunking::{Chunker, ParagraphChunker};
use crate::config::RagConfig;
use crate::document::{Match, Passage};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::source::{DocumentSource, HttpSource, PdfTextExtractor, TextExtractor};
use crate::vectorstore::VectorStore;

/// What [`RagPipeline::ensure_populated`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The collection already held passages; nothing was fetched.
    AlreadyPopulated {
        /// Number of passages found in the collection.
        count: usize,
    },
    /// The source was ingested.
    Ingested {
        /// Number of passages written.
        count: usize,
    },
}

impl IngestOutcome {
    /// Passages in the collection after the call.
    pub fn count(&self) -> usize {
        match self {
            Self::AlreadyPopulated { count } | Self::Ingested { count } => *count,
        }
    }
}

/// The RAG pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    source: Arc<dyn DocumentSource>,
    extractor: Arc<dyn TextExtractor>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Number of passages in the configured collection.
    pub async fn count(&self) -> Result<usize> {
        self.vector_store.count(&self.config.collection).await
    }

    /// Populate the collection from the source unless it already holds passages.
    ///
    /// Every passage is embedded before anything is written, and the write
    /// is a single bulk [`VectorStore::add`], so a failure at any step leaves
    /// the collection empty.
    ///
    /// # Errors
    ///
    /// - [`RagError::Fetch`] / [`RagError::Timeout`] if the download fails
    /// - [`RagError::Extraction`] if the document yields no passages
    /// - embedding and vector store errors are propagated unchanged
    ///
    /// An empty collection created for a different embedding width is
    /// recreated with the provider's width.
    pub async fn ensure_populated(&self) -> Result<IngestOutcome> {
        let collection = self.config.collection.as_str();
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(collection, dimensions).await?;

        let existing = self.vector_store.count(collection).await?;
        if existing > 0 {
            info!(collection, count = existing, "vector store already populated");
            warn!(
                collection,
                source = self.source.location(),
                "existing passages are not checked against the configured source; \
                 delete the store to re-ingest a different document"
            );
            return Ok(IngestOutcome::AlreadyPopulated { count: existing });
        }

        if let Some(stored) =
            self.vector_store.dimensions(collection).await?.filter(|&d| d != dimensions)
        {
            warn!(collection, stored, expected = dimensions, "recreating empty collection");
            self.vector_store.delete_collection(collection).await?;
            self.vector_store.create_collection(collection, dimensions).await?;
        }

        info!(collection, source = self.source.location(), "populating vector store");

        // 1. Fetch and extract
        let bytes = self.source.fetch().await?;
        let pages = self.extractor.extract_pages(&bytes)?;

        // 2. Chunk
        let passages = self.chunker.chunk(&pages);
        if passages.is_empty() {
            error!(source = self.source.location(), pages = pages.len(), "no passages extracted");
            return Err(RagError::Extraction(format!(
                "no passages longer than {} characters found in {} page(s) of {}",
                self.config.min_passage_chars,
                pages.len(),
                self.source.location()
            )));
        }
        info!(passages = passages.len(), pages = pages.len(), "chunked source document");

        // 3. Embed everything before writing
        let passages = self.embed_passages(passages).await?;

        // 4. Single bulk insert
        self.vector_store.add(collection, &passages).await.map_err(|e| {
            error!(collection, error = %e, "bulk insert failed");
            e
        })?;

        let count = passages.len();
        info!(collection, count, "added passages to vector store");
        Ok(IngestOutcome::Ingested { count })
    }

    async fn embed_passages(&self, passages: Vec<Passage>) -> Result<Vec<Passage>> {
        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(
                model = self.embedding_provider.model_name(),
                error = %e,
                "embedding failed during ingestion"
            );
            e
        })?;

        if embeddings.len() != passages.len() {
            return Err(RagError::Embedding {
                provider: self.embedding_provider.model_name().to_string(),
                message: format!(
                    "expected {} embeddings, got {}",
                    passages.len(),
                    embeddings.len()
                ),
            });
        }

        Ok(passages.into_iter().zip(embeddings).map(|(p, e)| p.with_embedding(e)).collect())
    }

    /// Embed `query` and return up to `k` nearest passages, best first.
    ///
    /// An empty collection yields an empty list.
    ///
    /// # Errors
    ///
    /// - [`RagError::Config`] if `k == 0`
    /// - [`RagError::DimensionMismatch`] if the query embedding's length
    ///   differs from the collection's
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<Match>> {
        if k == 0 {
            return Err(RagError::Config("k must be greater than zero".to_string()));
        }
        let collection = self.config.collection.as_str();

        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;

        let Some(dimensions) = self.vector_store.dimensions(collection).await? else {
            return Ok(Vec::new());
        };
        if dimensions != query_embedding.len() {
            error!(
                collection,
                expected = dimensions,
                actual = query_embedding.len(),
                "query dimension mismatch"
            );
            return Err(RagError::DimensionMismatch {
                expected: dimensions,
                actual: query_embedding.len(),
            });
        }

        let matches = self.vector_store.search(collection, &query_embedding, k).await?;
        info!(result_count = matches.len(), k, "query completed");
        Ok(matches)
    }

    /// [`search`](Self::search) with the configured `top_k`, returning only
    /// passage texts.
    pub async fn retrieve_context(&self, query: &str) -> Result<Vec<String>> {
        let matches = self.search(query, self.config.top_k).await?;
        Ok(matches.into_iter().map(|m| m.passage.text).collect())
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `embedding_provider` and `vector_store` are required. The chunker defaults
/// to a [`ParagraphChunker`] using `config.min_passage_chars`, the source to
/// an [`HttpSource`] for `config.source_url`, and the extractor to
/// [`PdfTextExtractor`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    source: Option<Arc<dyn DocumentSource>>,
    extractor: Option<Arc<dyn TextExtractor>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration. Defaults to [`RagConfig::default()`].
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Override the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Override where the document is fetched from.
    pub fn source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Override how page text is extracted.
    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing or the
    /// default HTTP source cannot be constructed.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker = self
            .chunker
            .unwrap_or_else(|| Arc::new(ParagraphChunker::new(config.min_passage_chars)));
        let source = match self.source {
            Some(source) => source,
            None => Arc::new(HttpSource::new(config.source_url.clone(), config.request_timeout())?),
        };
        let extractor = self.extractor.unwrap_or_else(|| Arc::new(PdfTextExtractor));

        Ok(RagPipeline { config, embedding_provider, vector_store, chunker, source, extractor })
    }
}
