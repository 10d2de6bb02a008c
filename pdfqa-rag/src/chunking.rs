//! Splitting extracted page text into passages.
//!
//! This module provides the [`Chunker`] trait and [`ParagraphChunker`], which
//! cuts each page on blank lines and drops blocks too short to be useful.

use tracing::debug;

use crate::document::{Passage, PassageMetadata};

/// A strategy for splitting extracted pages into passages.
///
/// Implementations produce [`Passage`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split ordered page texts into ordered passages.
    ///
    /// Pages with no usable text contribute nothing.
    fn chunk(&self, pages: &[String]) -> Vec<Passage>;
}

/// Splits each page on blank lines and keeps blocks longer than `min_chars`.
///
/// Passage IDs are `page_{i}_chunk_{j}` where `j` counts every block on the
/// page, including the ones that were filtered out, so IDs stay stable when
/// the filter threshold changes.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::{Chunker, ParagraphChunker};
///
/// let chunker = ParagraphChunker::new(50);
/// let passages = chunker.chunk(&pages);
/// ```
#[derive(Debug, Clone)]
pub struct ParagraphChunker {
    min_chars: usize,
}

impl ParagraphChunker {
    /// Create a new `ParagraphChunker`.
    ///
    /// # Arguments
    ///
    /// * `min_chars`: blocks whose trimmed length is at most this many characters are dropped
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

impl Default for ParagraphChunker {
    fn default() -> Self {
        Self::new(50)
    }
}

impl Chunker for ParagraphChunker {
    fn chunk(&self, pages: &[String]) -> Vec<Passage> {
        let mut passages = Vec::new();

        for (page, text) in pages.iter().enumerate() {
            if text.trim().is_empty() {
                debug!(page, "skipping page without extractable text");
                continue;
            }

            let normalized = text.replace("\r\n", "\n");
            for (chunk, block) in normalized.split("\n\n").enumerate() {
                let block = block.trim();
                if block.chars().count() <= self.min_chars {
                    continue;
                }
                let metadata = PassageMetadata::new(page as u32, chunk as u32);
                passages.push(Passage::new(metadata, block));
            }
        }

        passages
    }
}
