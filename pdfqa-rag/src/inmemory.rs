//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. Nothing is persisted; it
//! is intended for tests and throwaway sessions.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Match, Passage};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorStore, check_dimensions, rank_by_cosine_distance};

#[derive(Debug)]
struct Collection {
    dimensions: usize,
    // Insertion order; ids are unique within the vector.
    passages: Vec<Passage>,
}

/// An in-memory vector store using cosine distance for search.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("recipes", 384).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(collection: &str) -> RagError {
    RagError::VectorStore {
        backend: "InMemory".to_string(),
        message: format!("collection '{collection}' does not exist"),
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(name.to_string())
            .or_insert_with(|| Collection { dimensions, passages: Vec::new() });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn add(&self, collection: &str, passages: &[Passage]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;

        // Validate everything before touching the collection.
        let mut seen: HashSet<&str> = store.passages.iter().map(|p| p.id.as_str()).collect();
        for passage in passages {
            check_dimensions(store.dimensions, passage.embedding.len())?;
            if !seen.insert(passage.id.as_str()) {
                return Err(RagError::VectorStore {
                    backend: "InMemory".to_string(),
                    message: format!("duplicate passage id '{}'", passage.id),
                });
            }
        }
        store.passages.extend_from_slice(passages);
        Ok(())
    }

    async fn get(&self, collection: &str, limit: Option<usize>) -> Result<Vec<Passage>> {
        let collections = self.collections.read().await;
        let Some(store) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let limit = limit.unwrap_or(usize::MAX);
        Ok(store.passages.iter().take(limit).cloned().collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, |c| c.passages.len()))
    }

    async fn dimensions(&self, collection: &str) -> Result<Option<usize>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map(|c| c.dimensions))
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<Match>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        check_dimensions(store.dimensions, embedding.len())?;
        Ok(rank_by_cosine_distance(store.passages.iter().cloned(), embedding, top_k))
    }
}
