//! Prompt assembly and answer generation.
//!
//! [`AnswerGenerator`] turns a question plus retrieved passages into a single
//! prompt and hands it to a [`ChatCompletion`] backend. Its
//! [`answer`](AnswerGenerator::answer) method never fails: backend errors are
//! folded into the returned text so an interactive session can keep going.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::error::Result;

/// Marker placed in the context section when retrieval found nothing.
pub const NO_CONTEXT_MARKER: &str = "No relevant context found.";

/// One message in a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// A `user` message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// A chat-completion request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    /// Conversation so far.
    pub messages: Vec<ChatMessage>,
    /// Which backing LLM to use.
    pub model: String,
    /// Sampling randomness.
    pub temperature: f32,
    /// Response length cap.
    pub max_tokens: u32,
}

/// A hosted chat-completion backend.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Provider name used in logs and error text, e.g. `Groq`.
    fn name(&self) -> &str;

    /// Send `request` and return the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Subject named in the prompt when none is configured.
pub const DEFAULT_SUBJECT: &str = "Thai recipes";

/// Context label used in the prompt when none is configured.
pub const DEFAULT_SOURCE_TITLE: &str = "Thai Recipes PDF";

/// The fixed wording around the retrieved context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    /// What the assistant answers questions about, e.g. `Thai recipes`.
    pub subject: String,
    /// How the context section is labelled, e.g. `Thai Recipes PDF`.
    pub source_title: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT, DEFAULT_SOURCE_TITLE)
    }
}

impl PromptTemplate {
    pub fn new(subject: impl Into<String>, source_title: impl Into<String>) -> Self {
        Self { subject: subject.into(), source_title: source_title.into() }
    }

    /// Build the prompt for `query` given ordered context passages.
    pub fn render(&self, query: &str, context: &[String]) -> String {
        let context =
            if context.is_empty() { NO_CONTEXT_MARKER.to_string() } else { context.join("\n\n") };

        format!(
            "You are a helpful assistant that answers questions about {subject} based on the \
             provided context.\n\
             \n\
             Context from {title}:\n\
             {context}\n\
             \n\
             User Question: {query}\n\
             \n\
             Please answer the question based on the context provided. If the context doesn't \
             contain relevant information, say so and provide a general helpful response.",
            subject = self.subject,
            title = self.source_title,
        )
    }
}

/// Formats prompts and calls the chat-completion backend.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::{AnswerGenerator, GenerationConfig};
///
/// let generator = AnswerGenerator::new(Arc::new(groq), GenerationConfig::default());
/// let reply = generator.answer("What goes into tom yum?", &context).await;
/// ```
pub struct AnswerGenerator {
    backend: Arc<dyn ChatCompletion>,
    config: GenerationConfig,
    template: PromptTemplate,
}

impl AnswerGenerator {
    /// Create a generator with the default [`PromptTemplate`].
    pub fn new(backend: Arc<dyn ChatCompletion>, config: GenerationConfig) -> Self {
        Self { backend, config, template: PromptTemplate::default() }
    }

    /// Replace the prompt template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// The sampling configuration in use.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Answer `query` from `context`.
    ///
    /// Backend failures are returned as `Error calling {provider}: {reason}`.
    pub async fn answer(&self, query: &str, context: &[String]) -> String {
        let prompt = self.template.render(query, context);
        debug!(prompt_len = prompt.len(), passages = context.len(), "built prompt");

        let request = CompletionRequest {
            messages: vec![ChatMessage::user(prompt)],
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        match self.backend.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(provider = self.backend.name(), error = %e, "completion failed");
                format!("Error calling {}: {e}", self.backend.name())
            }
        }
    }

    /// Send a short greeting to verify credentials and connectivity.
    ///
    /// Unlike [`answer`](Self::answer) this returns the error.
    pub async fn ping(&self) -> Result<String> {
        let request = CompletionRequest {
            messages: vec![ChatMessage::user("Hello!")],
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: 50,
        };
        self.backend.complete(&request).await
    }
}
