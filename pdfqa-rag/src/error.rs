//! Error types for the `pdfqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting, retrieving, or generating.
#[derive(Debug, Error)]
pub enum RagError {
    /// The source document could not be retrieved.
    #[error("Fetch error ({url}): {message}")]
    Fetch {
        /// The URL that was requested.
        url: String,
        /// A description of the failure.
        message: String,
    },

    /// No passages could be produced from the fetched document.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// An embedding's length disagrees with the collection's dimension.
    #[error("Dimension mismatch: collection expects {expected} dimensions, got {actual}")]
    DimensionMismatch {
        /// The dimension the collection was created with.
        expected: usize,
        /// The dimension of the offending embedding.
        actual: usize,
    },

    /// The chat-completion backend failed.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A required setting is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A network call exceeded its configured timeout.
    #[error("Timed out while {operation}")]
    Timeout {
        /// What was being attempted, e.g. "downloading the source document".
        operation: String,
    },

    /// Local file handling failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
