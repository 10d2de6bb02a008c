//! Configuration for ingestion, retrieval, and answer generation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// The PDF ingested when no other source is configured.
pub const DEFAULT_SOURCE_URL: &str = "https://phi-public.s3.amazonaws.com/recipes/ThaiRecipes.pdf";

/// The collection passages are stored in by default.
pub const DEFAULT_COLLECTION: &str = "pdf_recipes";

/// The chat model used by default.
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

/// Environment variable holding the chat-completion API key.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Configuration parameters for the ingestion and retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Name of the vector store collection.
    pub collection: String,
    /// URL of the PDF to ingest.
    pub source_url: String,
    /// Number of passages retrieved per question.
    pub top_k: usize,
    /// Passages whose trimmed length is at most this many characters are dropped.
    pub min_passage_chars: usize,
    /// Timeout applied to the source download, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            top_k: 3,
            min_passage_chars: 50,
            request_timeout_secs: 60,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// The download timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the URL of the PDF to ingest.
    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.config.source_url = url.into();
        self
    }

    /// Set the number of passages retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum passage length filter.
    pub fn min_passage_chars(mut self, chars: usize) -> Self {
        self.config.min_passage_chars = chars;
        self
    }

    /// Set the download timeout in seconds.
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `collection` is empty
    /// - `source_url` is not an `http(s)` URL
    /// - `top_k == 0`
    /// - `request_timeout_secs == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.collection.trim().is_empty() {
            return Err(RagError::Config("collection name must not be empty".to_string()));
        }
        let url = self.config.source_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RagError::Config(format!("source_url must be an http(s) URL, got '{url}'")));
        }
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.request_timeout_secs == 0 {
            return Err(RagError::Config("request timeout must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

/// Sampling options forwarded to the chat-completion backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Which backing LLM to use.
    pub model: String,
    /// Sampling randomness.
    pub temperature: f32,
    /// Response length cap.
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { model: DEFAULT_MODEL.to_string(), temperature: 0.7, max_tokens: 1000 }
    }
}

impl GenerationConfig {
    /// Create a new builder for constructing a [`GenerationConfig`].
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`GenerationConfig`].
#[derive(Debug, Clone, Default)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    /// Set the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the response length cap.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Build the [`GenerationConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the model is empty, the temperature is
    /// outside `0.0..=2.0`, or `max_tokens == 0`.
    pub fn build(self) -> Result<GenerationConfig> {
        if self.config.model.trim().is_empty() {
            return Err(RagError::Config("model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.config.temperature) {
            return Err(RagError::Config(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.config.temperature
            )));
        }
        if self.config.max_tokens == 0 {
            return Err(RagError::Config("max_tokens must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

/// Read and validate the chat-completion API key from [`API_KEY_ENV`].
///
/// # Errors
///
/// Returns [`RagError::Config`] if the variable is unset or blank.
pub fn api_key_from_env() -> Result<String> {
    validate_api_key(std::env::var(API_KEY_ENV).ok())
}

fn validate_api_key(value: Option<String>) -> Result<String> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        Some(_) => Err(RagError::Config(format!("{API_KEY_ENV} is set but empty"))),
        None => Err(RagError::Config(format!("{API_KEY_ENV} environment variable not set"))),
    }
}
