//! Fetching the source document and extracting its page text.

use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use lopdf::Encoding;
use tracing::{debug, error, info};

use crate::error::{RagError, Result};

/// Supplies the raw bytes of the document to ingest.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// A human-readable location for logs and errors.
    fn location(&self) -> &str;

    /// Retrieve the document bytes.
    async fn fetch(&self) -> Result<Vec<u8>>;
}

/// Downloads the document with a plain HTTP GET.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::HttpSource;
///
/// let source = HttpSource::new("https://example.com/manual.pdf", Duration::from_secs(60))?;
/// let bytes = source.fetch().await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    /// Create a source for `url` whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            RagError::Config(format!("failed to build HTTP client for '{url}': {e}"))
        })?;
        Ok(Self { client, url })
    }

    fn fetch_error(&self, e: reqwest::Error) -> RagError {
        if e.is_timeout() {
            return RagError::Timeout { operation: format!("downloading {}", self.url) };
        }
        RagError::Fetch { url: self.url.clone(), message: e.to_string() }
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    fn location(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        info!(url = %self.url, "downloading source document");

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            error!(url = %self.url, error = %e, "download failed");
            self.fetch_error(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(url = %self.url, %status, "download returned an error status");
            return Err(RagError::Fetch {
                url: self.url.clone(),
                message: format!("server returned {status}"),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.fetch_error(e))?;
        debug!(url = %self.url, bytes = bytes.len(), "downloaded source document");
        Ok(bytes.to_vec())
    }
}

/// Turns document bytes into ordered per-page text.
pub trait TextExtractor: Send + Sync {
    /// Extract the text of each page, in page order.
    ///
    /// A page whose text cannot be extracted yields an empty string rather
    /// than an error, so page indices stay aligned with the document.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>>;
}

/// Extracts page text from PDF documents with `lopdf`.
///
/// The bytes are written to a temporary file first and parsed from disk.
/// Text is laid out line by line from the page's content stream; a vertical
/// gap wider than [`PARAGRAPH_GAP`] font heights becomes a blank line, so
/// paragraphs survive into the extracted text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        let mut file = tempfile::Builder::new().prefix("pdfqa-").suffix(".pdf").tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        let document = lopdf::Document::load(file.path()).map_err(|e| {
            error!(error = %e, "failed to parse PDF");
            RagError::Extraction(format!("failed to parse PDF: {e}"))
        })?;

        let pages: Vec<String> = document
            .get_pages()
            .into_iter()
            .map(|(number, page_id)| {
                page_text(&document, page_id).unwrap_or_else(|e| {
                    debug!(page = number, error = %e, "no extractable text on page");
                    String::new()
                })
            })
            .collect();

        info!(pages = pages.len(), "extracted PDF text");
        Ok(pages)
    }
}

// ── Content stream layout ──────────────────────────────────────────

/// Line gap, in font heights, above which a new paragraph starts.
pub const PARAGRAPH_GAP: f32 = 1.5;

const DEFAULT_FONT_SIZE: f32 = 12.0;

fn page_text(document: &lopdf::Document, page_id: lopdf::ObjectId) -> lopdf::Result<String> {
    let encodings = document
        .get_page_fonts(page_id)?
        .into_iter()
        .map(|(name, font)| font.get_font_encoding(document).map(|encoding| (name, encoding)))
        .collect::<lopdf::Result<BTreeMap<Vec<u8>, Encoding>>>()?;
    let content = document.get_and_decode_page_content(page_id)?;

    let mut layout = TextLayout::default();
    let mut encoding = None;
    for operation in &content.operations {
        let operands = operation.operands.as_slice();
        match operation.operator.as_str() {
            "BT" => layout.begin_object(),
            "ET" => layout.end_object(),
            "Tf" => {
                encoding = operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| encodings.get(name));
                if let Some(size) = operands.get(1).and_then(|size| size.as_float().ok()) {
                    layout.font_size = size.abs();
                }
            }
            "TL" => layout.leading = number(operands, 0),
            "Td" => layout.move_line(number(operands, 1)),
            "TD" => {
                let ty = number(operands, 1);
                layout.leading = -ty;
                layout.move_line(ty);
            }
            "Tm" => layout.set_matrix(number(operands, 3), number(operands, 5)),
            "T*" => layout.next_line(),
            "Tj" | "TJ" => layout.show(encoding, operands)?,
            "'" => {
                layout.next_line();
                layout.show(encoding, operands)?;
            }
            "\"" => {
                layout.next_line();
                layout.show(encoding, operands.get(2..).unwrap_or_default())?;
            }
            _ => {}
        }
    }
    Ok(layout.finish())
}

fn number(operands: &[lopdf::Object], index: usize) -> f32 {
    operands.get(index).and_then(|o| o.as_float().ok()).unwrap_or(0.0)
}

/// Tracks the text line position while a page's operators are replayed.
///
/// Only the vertical position is tracked; the gap between two shown strings
/// picks the separator written between them.
#[derive(Debug, Default)]
struct TextLayout {
    text: String,
    font_size: f32,
    leading: f32,
    /// Vertical scale of the text matrix.
    scale: f32,
    line_y: f32,
    shown_y: Option<f32>,
    object_ended: bool,
}

impl TextLayout {
    fn begin_object(&mut self) {
        self.scale = 1.0;
        self.line_y = 0.0;
    }

    fn end_object(&mut self) {
        self.object_ended = true;
    }

    fn move_line(&mut self, ty: f32) {
        self.line_y += ty * self.scale();
    }

    fn next_line(&mut self) {
        self.line_y -= self.leading * self.scale();
    }

    fn set_matrix(&mut self, d: f32, f: f32) {
        self.scale = d.abs();
        self.line_y = f;
    }

    fn scale(&self) -> f32 {
        if self.scale > 0.0 { self.scale } else { 1.0 }
    }

    fn line_height(&self) -> f32 {
        let size = if self.font_size > 0.0 { self.font_size } else { DEFAULT_FONT_SIZE };
        size * self.scale()
    }

    fn show(
        &mut self,
        encoding: Option<&Encoding>,
        operands: &[lopdf::Object],
    ) -> lopdf::Result<()> {
        let Some(encoding) = encoding else {
            return Ok(());
        };
        let mut piece = String::new();
        collect_text(&mut piece, encoding, operands)?;
        if piece.is_empty() {
            return Ok(());
        }

        self.separate();
        self.text.push_str(&piece);
        self.shown_y = Some(self.line_y);
        self.object_ended = false;
        Ok(())
    }

    /// Emit the separator owed before text shown at the current line.
    fn separate(&mut self) {
        let Some(previous) = self.shown_y else {
            return;
        };
        let gap = (previous - self.line_y).abs();
        let separator = if gap > PARAGRAPH_GAP * self.line_height() {
            "\n\n"
        } else if gap > 0.5 {
            "\n"
        } else if self.object_ended && !self.text.ends_with(char::is_whitespace) {
            " "
        } else {
            ""
        };

        let trimmed = self.text.trim_end_matches([' ', '\t']).len();
        if separator.starts_with('\n') {
            self.text.truncate(trimmed);
        }
        self.text.push_str(separator);
    }

    fn finish(mut self) -> String {
        let trimmed = self.text.trim_end().len();
        self.text.truncate(trimmed);
        self.text
    }
}

fn collect_text(
    text: &mut String,
    encoding: &Encoding,
    operands: &[lopdf::Object],
) -> lopdf::Result<()> {
    for operand in operands {
        match operand {
            lopdf::Object::String(bytes, _) => {
                text.push_str(&lopdf::Document::decode_text(encoding, bytes)?);
            }
            lopdf::Object::Array(items) => collect_text(text, encoding, items)?,
            // Large negative kerning in a TJ array is a word gap.
            lopdf::Object::Integer(_) | lopdf::Object::Real(_) => {
                if operand.as_float().is_ok_and(|k| k < -100.0) && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
    Ok(())
}
