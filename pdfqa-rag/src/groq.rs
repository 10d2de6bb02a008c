//! Groq chat-completion backend using the OpenAI-compatible REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::generation::{ChatCompletion, CompletionRequest};

/// The Groq OpenAI-compatible API base.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// A [`ChatCompletion`] backend calling Groq's `/chat/completions` endpoint.
///
/// Uses `reqwest` directly; any OpenAI-compatible server works via
/// [`with_base_url`](GroqClient::with_base_url).
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::groq::GroqClient;
///
/// let client = GroqClient::new(api_key, Duration::from_secs(60))?;
/// let text = client.complete(&request).await?;
/// ```
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl GroqClient {
    /// Create a client with the given API key and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the key is empty or the HTTP client
    /// cannot be built.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::Config("Groq API key must not be empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_key, base_url: GROQ_API_BASE.to_string() })
    }

    /// Point the client at another OpenAI-compatible API base.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn generation_error(message: impl Into<String>) -> RagError {
        RagError::Generation { provider: "Groq".into(), message: message.into() }
    }
}

// ── OpenAI-compatible response types ───────────────────────────────

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pull the first choice's text out of a response body.
fn parse_completion(body: &str) -> Result<String> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| GroqClient::generation_error(format!("failed to parse response: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GroqClient::generation_error("response contained no message content"))
}

/// Prefer the API's own error message over the raw body.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

// ── ChatCompletion implementation ──────────────────────────────────

#[async_trait]
impl ChatCompletion for GroqClient {
    fn name(&self) -> &str {
        "Groq"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        debug!(
            provider = "Groq",
            model = %request.model,
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "sending chat completion"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Groq", error = %e, "request failed");
                if e.is_timeout() {
                    RagError::Timeout { operation: "waiting for Groq chat completion".into() }
                } else {
                    Self::generation_error(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::generation_error(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            error!(provider = "Groq", %status, "API error");
            return Err(Self::generation_error(format!(
                "API returned {status}: {}",
                error_detail(body)
            )));
        }

        parse_completion(&body)
    }
}
