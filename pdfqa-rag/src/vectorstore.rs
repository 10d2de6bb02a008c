//! Vector store trait for storing and searching passage embeddings.

use async_trait::async_trait;

use crate::document::{Match, Passage};
use crate::error::{RagError, Result};

/// A storage backend for passage embeddings with similarity search.
///
/// Implementations manage named collections of [`Passage`]s. Every collection
/// has a fixed embedding dimension chosen at creation; inserting or searching
/// with a vector of another length fails with [`RagError::DimensionMismatch`].
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::{VectorStore, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("recipes", 384).await?;
/// store.add("recipes", &passages).await?;
/// let matches = store.search("recipes", &query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its passages.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert passages in one operation. Passages must have embeddings set.
    ///
    /// Either every passage is stored or none is.
    async fn add(&self, collection: &str, passages: &[Passage]) -> Result<()>;

    /// Return up to `limit` passages (all when `None`) in insertion order,
    /// embeddings included.
    async fn get(&self, collection: &str, limit: Option<usize>) -> Result<Vec<Passage>>;

    /// Number of passages stored in the collection. Zero if it does not exist.
    async fn count(&self, collection: &str) -> Result<usize>;

    /// The embedding dimension of the collection, if it exists.
    async fn dimensions(&self, collection: &str) -> Result<Option<usize>>;

    /// Return the `top_k` passages closest to `embedding` by cosine distance,
    /// nearest first. Returned passages carry no embedding.
    async fn search(&self, collection: &str, embedding: &[f32], top_k: usize)
    -> Result<Vec<Match>>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Fail with [`RagError::DimensionMismatch`] unless `actual == expected`.
pub(crate) fn check_dimensions(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(RagError::DimensionMismatch { expected, actual })
    }
}

/// Score `candidates` against `query` and keep the `top_k` nearest.
///
/// Sorting is stable, so equal distances keep the candidates' order.
pub(crate) fn rank_by_cosine_distance(
    candidates: impl IntoIterator<Item = Passage>,
    query: &[f32],
    top_k: usize,
) -> Vec<Match> {
    let mut scored: Vec<Match> = candidates
        .into_iter()
        .map(|mut passage| {
            let distance = 1.0 - cosine_similarity(&passage.embedding, query);
            passage.embedding = Vec::new();
            Match { passage, distance }
        })
        .collect();

    scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}
