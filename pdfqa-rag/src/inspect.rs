//! Read-only diagnostics over a populated vector store.
//!
//! The [`Inspector`] produces plain report structs; each implements
//! [`Display`](std::fmt::Display) for console output.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::document::{Passage, preview};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::vectorstore::{VectorStore, cosine_similarity};

const RULE: &str = "============================================================";

/// Aggregate statistics over a set of embeddings.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct EmbeddingStats {
    /// Vector length.
    pub dimensions: usize,
    /// Mean over every component of every vector.
    pub mean: f32,
    /// Population standard deviation over every component.
    pub std_dev: f32,
    /// Smallest component.
    pub min: f32,
    /// Largest component.
    pub max: f32,
}

impl EmbeddingStats {
    /// Compute statistics, or `None` when there are no components.
    pub fn compute(embeddings: &[&[f32]]) -> Option<Self> {
        let dimensions = embeddings.first()?.len();
        let values: Vec<f64> =
            embeddings.iter().flat_map(|e| e.iter().map(|&v| f64::from(v))).collect();
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            dimensions,
            mean: mean as f32,
            std_dev: variance.sqrt() as f32,
            min: min as f32,
            max: max as f32,
        })
    }
}

/// One stored passage as shown by [`Inspector::summary`].
#[derive(Debug, Clone, Serialize)]
pub struct PassageSample {
    /// Passage id.
    pub id: String,
    /// Page index.
    pub page: u32,
    /// Chunk index.
    pub chunk: u32,
    /// First 100 characters of the text.
    pub preview: String,
    /// Embedding length.
    pub dimensions: usize,
    /// First three embedding components.
    pub head: Vec<f32>,
}

impl PassageSample {
    fn from_passage(passage: &Passage) -> Self {
        Self {
            id: passage.id.clone(),
            page: passage.metadata.page,
            chunk: passage.metadata.chunk,
            preview: preview(&passage.text, 100).to_string(),
            dimensions: passage.embedding.len(),
            head: passage.embedding.iter().take(3).copied().collect(),
        }
    }
}

/// Overview of the collection.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    /// Collection name.
    pub collection: String,
    /// Total passages stored.
    pub count: usize,
    /// The first few passages in insertion order.
    pub samples: Vec<PassageSample>,
    /// Statistics over the sampled embeddings.
    pub stats: Option<EmbeddingStats>,
    /// Cosine similarity between the first two samples.
    pub first_pair_similarity: Option<f32>,
}

/// One hit in a [`SearchReport`].
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// `1 - distance`.
    pub similarity: f32,
    /// Cosine distance.
    pub distance: f32,
    /// Page index.
    pub page: u32,
    /// Chunk index.
    pub chunk: u32,
    /// First 200 characters of the text.
    pub preview: String,
}

/// Result of [`Inspector::search`].
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    /// The query as given.
    pub query: String,
    /// Length of the query embedding.
    pub query_dimensions: usize,
    /// First three components of the query embedding.
    pub query_head: Vec<f32>,
    /// Nearest passages, best first.
    pub hits: Vec<SearchHit>,
}

/// Passages of one page in a [`PageReport`].
#[derive(Debug, Clone, Serialize)]
pub struct PageGroup {
    /// Page index.
    pub page: u32,
    /// Number of passages on the page.
    pub chunk_count: usize,
    /// 80-character previews of the first two passages.
    pub previews: Vec<String>,
}

/// Result of [`Inspector::pages`].
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    /// Total passages across all pages.
    pub total: usize,
    /// Groups in ascending page order.
    pub pages: Vec<PageGroup>,
}

/// Diagnostic reads of a collection.
pub struct Inspector {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    collection: String,
}

impl Inspector {
    /// Inspect `collection` in `store`, embedding queries with `embedder`.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: impl Into<String>,
    ) -> Self {
        Self { store, embedder, collection: collection.into() }
    }

    /// Count, the first `limit` passages and statistics over their embeddings.
    pub async fn summary(&self, limit: usize) -> Result<StoreSummary> {
        let count = self.store.count(&self.collection).await?;
        let passages = if count == 0 {
            Vec::new()
        } else {
            self.store.get(&self.collection, Some(limit)).await?
        };

        let embeddings: Vec<&[f32]> = passages.iter().map(|p| p.embedding.as_slice()).collect();
        let first_pair_similarity = match embeddings.as_slice() {
            [a, b, ..] => Some(cosine_similarity(a, b)),
            _ => None,
        };

        Ok(StoreSummary {
            collection: self.collection.clone(),
            count,
            stats: EmbeddingStats::compute(&embeddings),
            first_pair_similarity,
            samples: passages.iter().map(PassageSample::from_passage).collect(),
        })
    }

    /// Embed `query` and report the `k` nearest passages with their scores.
    ///
    /// A collection that was never created yields no hits.
    pub async fn search(&self, query: &str, k: usize) -> Result<SearchReport> {
        let embedding = self.embedder.embed(query).await?;
        debug!(query, dimensions = embedding.len(), "inspecting search");

        let matches = match self.store.dimensions(&self.collection).await? {
            Some(_) => self.store.search(&self.collection, &embedding, k).await?,
            None => Vec::new(),
        };
        let hits = matches
            .iter()
            .map(|m| SearchHit {
                similarity: m.similarity(),
                distance: m.distance,
                page: m.passage.metadata.page,
                chunk: m.passage.metadata.chunk,
                preview: preview(&m.passage.text, 200).to_string(),
            })
            .collect();

        Ok(SearchReport {
            query: query.to_string(),
            query_dimensions: embedding.len(),
            query_head: embedding.iter().take(3).copied().collect(),
            hits,
        })
    }

    /// Every passage grouped by page.
    pub async fn pages(&self) -> Result<PageReport> {
        let passages = self.store.get(&self.collection, None).await?;

        let mut grouped: BTreeMap<u32, Vec<&Passage>> = BTreeMap::new();
        for passage in &passages {
            grouped.entry(passage.metadata.page).or_default().push(passage);
        }

        let pages = grouped
            .into_iter()
            .map(|(page, chunks)| PageGroup {
                page,
                chunk_count: chunks.len(),
                previews: chunks.iter().take(2).map(|p| preview(&p.text, 80).to_string()).collect(),
            })
            .collect();

        Ok(PageReport { total: passages.len(), pages })
    }
}

fn head(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.4}")).collect();
    format!("[{}, ...]", parts.join(", "))
}

impl fmt::Display for StoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}\nVector store: {}\n{RULE}", self.collection)?;
        writeln!(f, "Total documents in database: {}", self.count)?;
        if self.count == 0 {
            return writeln!(f, "Database is empty. Run `pdfqa chat` first to ingest the document.");
        }

        writeln!(f, "\nFirst {} documents:", self.samples.len())?;
        for (i, sample) in self.samples.iter().enumerate() {
            writeln!(f, "\nDocument {}:", i + 1)?;
            writeln!(f, "   ID: {}", sample.id)?;
            writeln!(f, "   Page: {}, Chunk: {}", sample.page, sample.chunk)?;
            writeln!(f, "   Text Preview: {}...", sample.preview)?;
            writeln!(f, "   Embedding Shape: {} dimensions", sample.dimensions)?;
            writeln!(f, "   Embedding Sample: {}", head(&sample.head))?;
        }

        if let Some(stats) = &self.stats {
            writeln!(f, "\n{RULE}\nEmbedding statistics\n{RULE}")?;
            writeln!(f, "Embedding dimensions: {}", stats.dimensions)?;
            writeln!(f, "Mean embedding value: {:.4}", stats.mean)?;
            writeln!(f, "Std embedding value: {:.4}", stats.std_dev)?;
            writeln!(f, "Min embedding value: {:.4}", stats.min)?;
            writeln!(f, "Max embedding value: {:.4}", stats.max)?;
        }
        if let Some(similarity) = self.first_pair_similarity {
            writeln!(f, "Similarity between doc 1 & 2: {similarity:.4}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}\nSearching for: '{}'\n{RULE}", self.query)?;
        writeln!(f, "Query embedding shape: {} dimensions", self.query_dimensions)?;
        writeln!(f, "Query embedding sample: {}", head(&self.query_head))?;
        writeln!(f, "\nTop {} similar documents:", self.hits.len())?;
        for (i, hit) in self.hits.iter().enumerate() {
            writeln!(f, "\nResult {}:", i + 1)?;
            writeln!(f, "   Similarity Score: {:.4}", hit.similarity)?;
            writeln!(f, "   Distance: {:.4}", hit.distance)?;
            writeln!(f, "   Page: {}, Chunk: {}", hit.page, hit.chunk)?;
            writeln!(f, "   Text: {}...", hit.preview)?;
        }
        Ok(())
    }
}

impl fmt::Display for PageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}\nAll documents in database\n{RULE}")?;
        writeln!(f, "Total documents: {}", self.total)?;
        for group in &self.pages {
            writeln!(f, "\nPage {}: {} chunks", group.page, group.chunk_count)?;
            for text in &group.previews {
                writeln!(f, "   {text}...")?;
            }
        }
        Ok(())
    }
}
