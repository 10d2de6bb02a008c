//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pdfqa_rag::{
    ChatCompletion, CompletionRequest, DocumentSource, EmbeddingProvider, RagError, Result,
    TextExtractor,
};

pub const VOCABULARY: [&str; 4] = ["curry", "noodle", "soup", "rice"];

/// Embeds text as keyword counts over [`VOCABULARY`], one axis per word.
///
/// Deterministic and easy to reason about: a text mentioning only "soup" points
/// straight down the third axis.
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        Ok(VOCABULARY.iter().map(|word| lower.matches(word).count() as f32).collect())
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }

    fn model_name(&self) -> &str {
        "keyword"
    }
}

/// Always returns a vector of a fixed, configurable length.
pub struct FixedDimEmbedder(pub usize);

#[async_trait]
impl EmbeddingProvider for FixedDimEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0; self.0])
    }

    fn dimensions(&self) -> usize {
        self.0
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

/// Embeds the first `ok` texts, then fails.
pub struct FlakyEmbedder {
    pub ok: usize,
    seen: AtomicUsize,
}

impl FlakyEmbedder {
    pub fn new(ok: usize) -> Self {
        Self { ok, seen: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        if self.seen.fetch_add(1, Ordering::SeqCst) >= self.ok {
            return Err(RagError::Embedding { provider: "flaky".into(), message: "boom".into() });
        }
        Ok(vec![1.0, 0.0, 0.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        "flaky"
    }
}

/// Serves fixed bytes and counts fetches.
pub struct StaticSource {
    pub fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self { fetches: AtomicUsize::new(0) }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    fn location(&self) -> &str {
        "memory://recipes.pdf"
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(b"%PDF-fake".to_vec())
    }
}

/// A source whose download always fails.
pub struct UnreachableSource;

#[async_trait]
impl DocumentSource for UnreachableSource {
    fn location(&self) -> &str {
        "http://unreachable.invalid/recipes.pdf"
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        Err(RagError::Fetch { url: self.location().into(), message: "connection refused".into() })
    }
}

/// Ignores the bytes and returns canned pages.
pub struct CannedPages(pub Vec<String>);

impl TextExtractor for CannedPages {
    fn extract_pages(&self, _bytes: &[u8]) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Pads `text` past the default 50-character passage filter.
pub fn long(text: &str) -> String {
    format!("{text}, padded with enough extra words to clear the minimum passage length.")
}

/// A two-page cookbook: page 0 has curry and noodles, page 1 has soup.
pub fn cookbook() -> Vec<String> {
    vec![
        format!(
            "Contents\n\n{}\n\n{}",
            long("Green curry with curry paste"),
            long("Drunken noodle")
        ),
        format!("{}\n\nnotes", long("Tom yum soup, a hot and sour soup")),
    ]
}

/// Records every request and replies with a canned result.
pub struct RecordingChat {
    pub requests: Mutex<Vec<CompletionRequest>>,
    reply: std::result::Result<String, String>,
}

impl RecordingChat {
    pub fn replying(text: &str) -> Self {
        Self { requests: Mutex::new(Vec::new()), reply: Ok(text.to_string()) }
    }

    pub fn failing(reason: &str) -> Self {
        Self { requests: Mutex::new(Vec::new()), reply: Err(reason.to_string()) }
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatCompletion for RecordingChat {
    fn name(&self) -> &str {
        "Recording"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply
            .clone()
            .map_err(|message| RagError::Generation { provider: "Recording".into(), message })
    }
}
