//! Data types for passages and search matches.

use serde::{Deserialize, Serialize};

/// Where a [`Passage`] came from in the source document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassageMetadata {
    /// Zero-based page index.
    pub page: u32,
    /// Zero-based index of the blank-line separated block within the page.
    pub chunk: u32,
}

impl PassageMetadata {
    /// Create metadata for the given page and chunk position.
    pub fn new(page: u32, chunk: u32) -> Self {
        Self { page, chunk }
    }

    /// The stable passage id derived from this location.
    pub fn passage_id(&self) -> String {
        format!("page_{}_chunk_{}", self.page, self.chunk)
    }
}

/// A stored, retrievable unit of source text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passage {
    /// Unique identifier, `page_{page}_chunk_{chunk}`.
    pub id: String,
    /// The trimmed passage text.
    pub text: String,
    /// The vector embedding for this passage's text. Empty until embedded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    /// Location of the passage in the source document.
    pub metadata: PassageMetadata,
}

impl Passage {
    /// Create an un-embedded passage at the given location.
    pub fn new(metadata: PassageMetadata, text: impl Into<String>) -> Self {
        Self { id: metadata.passage_id(), text: text.into(), embedding: Vec::new(), metadata }
    }

    /// Attach an embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

/// A retrieved [`Passage`] paired with its cosine distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    /// The retrieved passage.
    pub passage: Passage,
    /// Cosine distance to the query (0 = identical direction).
    pub distance: f32,
}

impl Match {
    /// `1 - distance`; higher is more relevant.
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// Truncate `text` to at most `max_chars` characters without splitting a code point.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
