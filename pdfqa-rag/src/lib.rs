//! Retrieval-augmented question answering over a single PDF.
//!
//! This crate provides:
//! - Blank-line passage chunking with stable `page_{i}_chunk_{j}` ids
//! - Pluggable embedding, vector store, chat-completion and document source traits
//! - An ingestion pipeline that populates a collection once and skips when populated
//! - Top-k cosine retrieval and prompt assembly for a hosted chat model
//! - Read-only inspection reports over the stored passages
//!
//! # Feature flags
//!
//! | Feature | Default | Provides |
//! |---|---|---|
//! | `fastembed` | yes | [`FastEmbedProvider`] (all-MiniLM-L6-v2, 384 dims) |
//! | `sqlite` | yes | [`SqliteVectorStore`] |

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod groq;
pub mod inmemory;
pub mod inspect;
pub mod pipeline;
pub mod source;
pub mod vectorstore;

#[cfg(feature = "fastembed")]
pub mod fastembed;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use chunking::{Chunker, ParagraphChunker};
pub use config::{
    API_KEY_ENV, DEFAULT_COLLECTION, DEFAULT_MODEL, DEFAULT_SOURCE_URL, GenerationConfig,
    GenerationConfigBuilder, RagConfig, RagConfigBuilder, api_key_from_env,
};
pub use document::{Match, Passage, PassageMetadata};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::{
    AnswerGenerator, ChatCompletion, ChatMessage, CompletionRequest, DEFAULT_SOURCE_TITLE,
    DEFAULT_SUBJECT, NO_CONTEXT_MARKER, PromptTemplate,
};
pub use groq::GroqClient;
pub use inmemory::InMemoryVectorStore;
pub use inspect::{Inspector, PageReport, SearchReport, StoreSummary};
pub use pipeline::{IngestOutcome, RagPipeline, RagPipelineBuilder};
pub use source::{DocumentSource, HttpSource, PdfTextExtractor, TextExtractor};
pub use vectorstore::{VectorStore, cosine_similarity};

#[cfg(feature = "fastembed")]
pub use crate::fastembed::FastEmbedProvider;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteVectorStore;
