use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pdfqa_rag::{
    DEFAULT_COLLECTION, DEFAULT_MODEL, DEFAULT_SOURCE_TITLE, DEFAULT_SOURCE_URL, DEFAULT_SUBJECT,
    GenerationConfig, PromptTemplate, RagConfig,
};

#[derive(Parser, Debug)]
#[command(name = "pdfqa")]
#[command(version)]
#[command(about = "Ask questions about a PDF, answered by a hosted LLM", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ingest the document if needed, then answer questions interactively
    Chat,
    /// Print diagnostics about the stored passages
    Inspect {
        #[command(subcommand)]
        view: Option<InspectView>,
    },
    /// Verify the API key and that the chat model answers
    Check,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum InspectView {
    /// Passage count, first few passages and embedding statistics
    Summary,
    /// Nearest passages to a query, with scores
    Search {
        /// Text to search for
        #[arg(default_value = "Thai curry")]
        query: String,
    },
    /// Every passage grouped by page
    Pages,
    /// Summary, search and pages in one go
    All,
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// SQLite file holding the vector store
    #[arg(long, global = true, env = "PDFQA_DB_PATH", default_value = "./pdfqa.sqlite")]
    pub db_path: PathBuf,

    /// Collection the passages are stored in
    #[arg(long, global = true, env = "PDFQA_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// URL of the PDF to ingest
    #[arg(long, global = true, env = "PDFQA_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// What the document is about, as named in the prompt
    #[arg(long, global = true, env = "PDFQA_SUBJECT", default_value = DEFAULT_SUBJECT)]
    pub subject: String,

    /// Label for the retrieved context in the prompt
    #[arg(long, global = true, env = "PDFQA_TITLE", default_value = DEFAULT_SOURCE_TITLE)]
    pub title: String,

    /// Chat model identifier
    #[arg(long, global = true, env = "PDFQA_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Passages retrieved per question
    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    /// Sampling temperature (0.0 to 2.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Response length cap
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Settings {
    pub fn rag_config(&self) -> pdfqa_rag::Result<RagConfig> {
        let mut builder =
            RagConfig::builder().collection(&self.collection).source_url(&self.source_url);
        if let Some(k) = self.top_k {
            builder = builder.top_k(k);
        }
        builder.build()
    }

    pub fn generation_config(&self) -> pdfqa_rag::Result<GenerationConfig> {
        let mut builder = GenerationConfig::builder().model(&self.model);
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        builder.build()
    }

    pub fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate::new(&self.subject, &self.title)
    }
}
