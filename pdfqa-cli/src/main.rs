//! `pdfqa`: ask questions about a PDF from the terminal.
//!
//! ```bash
//! export GROQ_API_KEY=...
//! pdfqa                     # ingest on first run, then chat
//! pdfqa inspect search "green curry"
//! pdfqa check
//! ```

mod check;
mod cli;
mod console;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pdfqa_rag::{
    AnswerGenerator, EmbeddingProvider, FastEmbedProvider, GroqClient, IngestOutcome, Inspector,
    RagPipeline, SqliteVectorStore, VectorStore, api_key_from_env,
};

use crate::cli::{Cli, Command, InspectView, Settings};

const RULE: &str = "============================================================";
const DEFAULT_INSPECT_QUERY: &str = "Thai curry";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.settings.verbose);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(&cli.settings).await,
        Command::Inspect { view } => {
            run_inspect(&cli.settings, view.unwrap_or(InspectView::All)).await
        }
        Command::Check => run_check(&cli.settings).await,
    }
}

/// Validate settings and the API key before anything touches the network.
fn build_generator(settings: &Settings) -> Result<(AnswerGenerator, usize)> {
    let generation = settings.generation_config()?;
    let timeout = settings.rag_config()?.request_timeout();
    let api_key = api_key_from_env()?;
    let key_len = api_key.len();
    let backend = GroqClient::new(api_key, timeout)?;
    let generator = AnswerGenerator::new(Arc::new(backend), generation)
        .with_template(settings.prompt_template());
    Ok((generator, key_len))
}

async fn load_embedder() -> Result<Arc<dyn EmbeddingProvider>> {
    let provider = tokio::task::spawn_blocking(FastEmbedProvider::new)
        .await
        .context("embedding model loader panicked")??;
    Ok(Arc::new(provider))
}

async fn open_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    let store = SqliteVectorStore::open(&settings.db_path)
        .await
        .with_context(|| format!("opening vector store at {}", settings.db_path.display()))?;
    Ok(Arc::new(store))
}

async fn run_chat(settings: &Settings) -> Result<()> {
    let rag_config = settings.rag_config()?;
    let (generator, _) = build_generator(settings)?;

    println!("{RULE}");
    println!("PDF Assistant");
    println!("Knowledge: {}", rag_config.source_url);
    println!("Model: Groq {}", generator.config().model);
    println!("Vector DB: {}", settings.db_path.display());
    println!("{RULE}");
    println!("Setting up...");

    let pipeline = RagPipeline::builder()
        .config(rag_config)
        .embedding_provider(load_embedder().await?)
        .vector_store(open_store(settings).await?)
        .build()?;

    match pipeline.ensure_populated().await? {
        IngestOutcome::AlreadyPopulated { count } => {
            println!("Vector DB already has {count} passages");
        }
        IngestOutcome::Ingested { count } => println!("Added {count} passages to vector DB"),
    }

    match generator.ping().await {
        Ok(_) => println!("Groq connection successful"),
        Err(e) => {
            println!("Groq connection failed: {e}");
            return Err(e).context("chat model is unreachable");
        }
    }

    println!("\nReady! Ask me about {}.", settings.subject);
    println!("Try: 'What does the document cover?'");
    println!("Type 'quit' to exit\n");

    console::run(&pipeline, &generator).await
}

async fn run_inspect(settings: &Settings, view: InspectView) -> Result<()> {
    let rag_config = settings.rag_config()?;
    let inspector =
        Inspector::new(open_store(settings).await?, load_embedder().await?, rag_config.collection);

    match view {
        InspectView::Summary => print!("{}", inspector.summary(5).await?),
        InspectView::Search { query } => print!("{}", inspector.search(&query, 3).await?),
        InspectView::Pages => print!("{}", inspector.pages().await?),
        InspectView::All => {
            let summary = inspector.summary(5).await?;
            print!("{summary}");
            if summary.count > 0 {
                println!();
                print!("{}", inspector.search(DEFAULT_INSPECT_QUERY, 3).await?);
                println!();
                print!("{}", inspector.pages().await?);
            }
        }
    }
    Ok(())
}

async fn run_check(settings: &Settings) -> Result<()> {
    let (generator, key_len) = build_generator(settings)?;
    check::run(&generator, key_len).await
}
