use std::fmt;

use anyhow::{Result, bail};
use pdfqa_rag::{API_KEY_ENV, AnswerGenerator};

/// Likely cause of a failed connectivity check, judged from the error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimit,
    Authentication,
    Quota,
    Other,
}

impl FailureKind {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("rate limit") {
            Self::RateLimit
        } else if lower.contains("401") || lower.contains("invalid api key") {
            Self::Authentication
        } else if lower.contains("quota") {
            Self::Quota
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hint = match self {
            Self::RateLimit => "Rate limit error - wait a moment and try again".to_string(),
            Self::Authentication => format!("Authentication error - check {API_KEY_ENV}"),
            Self::Quota => "Quota exceeded - check your Groq account".to_string(),
            Self::Other => "Unexpected failure - re-run with -v for details".to_string(),
        };
        f.write_str(&hint)
    }
}

/// Ping the chat model and explain any failure.
pub async fn run(generator: &AnswerGenerator, key_len: usize) -> Result<()> {
    println!("Found {API_KEY_ENV} (length: {key_len})");
    println!("Testing API call with model {}...", generator.config().model);

    match generator.ping().await {
        Ok(reply) => {
            println!("API call successful");
            println!("Response: {reply}");
            Ok(())
        }
        Err(e) => {
            let message = e.to_string();
            println!("API call failed: {message}");
            println!("{}", FailureKind::classify(&message));
            bail!("connectivity check failed")
        }
    }
}
