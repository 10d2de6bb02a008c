//! Ingestion and retrieval through `RagPipeline` with in-memory collaborators.

mod common;

use std::sync::Arc;

use common::{
    CannedPages, FixedDimEmbedder, FlakyEmbedder, KeywordEmbedder, StaticSource,
    UnreachableSource, cookbook, long,
};
use pdfqa_rag::{
    EmbeddingProvider, InMemoryVectorStore, IngestOutcome, RagConfig, RagError, RagPipeline,
    VectorStore,
};

fn pipeline_with(
    store: Arc<InMemoryVectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    source: Arc<StaticSource>,
    pages: Vec<String>,
) -> RagPipeline {
    RagPipeline::builder()
        .config(RagConfig::default())
        .embedding_provider(embedder)
        .vector_store(store)
        .source(source)
        .extractor(Arc::new(CannedPages(pages)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn ensure_populated_is_idempotent() {
    let store = Arc::new(InMemoryVectorStore::new());
    let source = Arc::new(StaticSource::new());
    let pipeline =
        pipeline_with(store.clone(), Arc::new(KeywordEmbedder::new()), source.clone(), cookbook());

    let first = pipeline.ensure_populated().await.unwrap();
    assert_eq!(first, IngestOutcome::Ingested { count: 3 });

    let second = pipeline.ensure_populated().await.unwrap();
    assert_eq!(second, IngestOutcome::AlreadyPopulated { count: 3 });

    assert_eq!(source.fetch_count(), 1);
    assert_eq!(pipeline.count().await.unwrap(), 3);
}

#[tokio::test]
async fn empty_collection_with_other_width_is_recreated() {
    let store = Arc::new(InMemoryVectorStore::new());
    store.create_collection("pdf_recipes", 3).await.unwrap();
    let pipeline = pipeline_with(
        store.clone(),
        Arc::new(KeywordEmbedder::new()),
        Arc::new(StaticSource::new()),
        cookbook(),
    );

    let outcome = pipeline.ensure_populated().await.unwrap();
    assert_eq!(outcome, IngestOutcome::Ingested { count: 3 });
    assert_eq!(store.dimensions("pdf_recipes").await.unwrap(), Some(4));
    assert_eq!(pipeline.search("curry", 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn stored_ids_follow_page_and_block_position() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(
        store.clone(),
        Arc::new(KeywordEmbedder::new()),
        Arc::new(StaticSource::new()),
        cookbook(),
    );
    pipeline.ensure_populated().await.unwrap();

    let stored = store.get("pdf_recipes", None).await.unwrap();
    let ids: Vec<&str> = stored.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["page_0_chunk_1", "page_0_chunk_2", "page_1_chunk_0"]);
    assert!(stored.iter().all(|p| p.embedding.len() == 4));
}

#[tokio::test]
async fn fetch_failure_leaves_store_empty() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = RagPipeline::builder()
        .embedding_provider(Arc::new(KeywordEmbedder::new()))
        .vector_store(store.clone())
        .source(Arc::new(UnreachableSource))
        .extractor(Arc::new(CannedPages(cookbook())))
        .build()
        .unwrap();

    let result = pipeline.ensure_populated().await;
    assert!(matches!(result, Err(RagError::Fetch { .. })));
    assert_eq!(store.count("pdf_recipes").await.unwrap(), 0);
}

#[tokio::test]
async fn document_without_passages_is_an_extraction_error() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pages = vec![String::new(), "tiny\n\nbits".to_string()];
    let pipeline = pipeline_with(
        store.clone(),
        Arc::new(KeywordEmbedder::new()),
        Arc::new(StaticSource::new()),
        pages,
    );

    let result = pipeline.ensure_populated().await;
    assert!(matches!(result, Err(RagError::Extraction(_))));
    assert_eq!(store.count("pdf_recipes").await.unwrap(), 0);
}

#[tokio::test]
async fn embedding_failure_partway_writes_nothing() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(
        store.clone(),
        Arc::new(FlakyEmbedder::new(2)),
        Arc::new(StaticSource::new()),
        cookbook(),
    );

    let result = pipeline.ensure_populated().await;
    assert!(matches!(result, Err(RagError::Embedding { .. })));
    assert_eq!(store.count("pdf_recipes").await.unwrap(), 0);
}

#[tokio::test]
async fn closest_passage_is_returned_first() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(
        store,
        Arc::new(KeywordEmbedder::new()),
        Arc::new(StaticSource::new()),
        vec![
            long("A: green curry"),
            long("B: hot and sour soup"),
            long("C: sticky rice with mango"),
        ],
    );
    pipeline.ensure_populated().await.unwrap();

    let matches = pipeline.search("which soup should I cook?", 3).await.unwrap();
    assert_eq!(matches.len(), 3);
    assert!(matches[0].passage.text.starts_with("B:"));
    assert!(matches[0].similarity() > matches[1].similarity());
    for pair in matches.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[tokio::test]
async fn k_larger_than_store_returns_everything() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(
        store,
        Arc::new(KeywordEmbedder::new()),
        Arc::new(StaticSource::new()),
        vec![long("curry one"), long("noodle two")],
    );
    pipeline.ensure_populated().await.unwrap();

    let matches = pipeline.search("curry", 5).await.unwrap();
    assert_eq!(matches.len(), 2);
}

#[tokio::test]
async fn empty_store_yields_no_matches() {
    let pipeline = pipeline_with(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(KeywordEmbedder::new()),
        Arc::new(StaticSource::new()),
        cookbook(),
    );
    assert!(pipeline.search("curry", 3).await.unwrap().is_empty());

    let store = Arc::new(InMemoryVectorStore::new());
    store.create_collection("pdf_recipes", 4).await.unwrap();
    let pipeline = pipeline_with(
        store,
        Arc::new(KeywordEmbedder::new()),
        Arc::new(StaticSource::new()),
        cookbook(),
    );
    assert!(pipeline.search("curry", 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn query_with_other_dimension_is_rejected() {
    let store = Arc::new(InMemoryVectorStore::new());
    let ingest = pipeline_with(
        store.clone(),
        Arc::new(KeywordEmbedder::new()),
        Arc::new(StaticSource::new()),
        cookbook(),
    );
    ingest.ensure_populated().await.unwrap();

    let query = pipeline_with(
        store,
        Arc::new(FixedDimEmbedder(3)),
        Arc::new(StaticSource::new()),
        cookbook(),
    );
    let result = query.search("curry", 3).await;
    assert!(matches!(result, Err(RagError::DimensionMismatch { expected: 4, actual: 3 })));
}

#[tokio::test]
async fn zero_k_is_a_config_error() {
    let pipeline = pipeline_with(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(KeywordEmbedder::new()),
        Arc::new(StaticSource::new()),
        cookbook(),
    );
    assert!(matches!(pipeline.search("curry", 0).await, Err(RagError::Config(_))));
}

#[tokio::test]
async fn retrieve_context_uses_configured_top_k() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = RagPipeline::builder()
        .config(RagConfig::builder().top_k(1).build().unwrap())
        .embedding_provider(Arc::new(KeywordEmbedder::new()))
        .vector_store(store)
        .source(Arc::new(StaticSource::new()))
        .extractor(Arc::new(CannedPages(cookbook())))
        .build()
        .unwrap();
    pipeline.ensure_populated().await.unwrap();

    let context = pipeline.retrieve_context("noodle").await.unwrap();
    assert_eq!(context.len(), 1);
    assert!(context[0].starts_with("Drunken noodle"));
}

#[test]
fn builder_requires_embedder_and_store() {
    let missing_store =
        RagPipeline::builder().embedding_provider(Arc::new(KeywordEmbedder::new())).build();
    assert!(matches!(missing_store, Err(RagError::Config(_))));

    let missing_embedder =
        RagPipeline::builder().vector_store(Arc::new(InMemoryVectorStore::new())).build();
    assert!(matches!(missing_embedder, Err(RagError::Config(_))));
}
