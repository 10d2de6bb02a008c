//! Persistence and search behaviour of `SqliteVectorStore`.

#![cfg(feature = "sqlite")]

use pdfqa_rag::{Passage, PassageMetadata, RagError, SqliteVectorStore, VectorStore};

fn passage(page: u32, chunk: u32, embedding: Vec<f32>) -> Passage {
    Passage::new(PassageMetadata::new(page, chunk), format!("text of page {page} chunk {chunk}"))
        .with_embedding(embedding)
}

#[tokio::test]
async fn passages_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.sqlite");

    {
        let store = SqliteVectorStore::open(&path).await.unwrap();
        store.create_collection("recipes", 3).await.unwrap();
        let passages = [passage(0, 1, vec![1.0, 0.0, 0.0]), passage(2, 0, vec![0.0, 1.0, 0.0])];
        store.add("recipes", &passages).await.unwrap();
    }

    let store = SqliteVectorStore::open(&path).await.unwrap();
    assert_eq!(store.count("recipes").await.unwrap(), 2);
    assert_eq!(store.dimensions("recipes").await.unwrap(), Some(3));

    let stored = store.get("recipes", None).await.unwrap();
    assert_eq!(stored[0].id, "page_0_chunk_1");
    assert_eq!(stored[0].embedding, vec![1.0, 0.0, 0.0]);
    assert_eq!(stored[1].metadata, PassageMetadata::new(2, 0));
}

#[tokio::test]
async fn search_orders_by_cosine_distance() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("s.sqlite")).await.unwrap();
    store.create_collection("c", 2).await.unwrap();
    store
        .add(
            "c",
            &[
                passage(0, 0, vec![0.0, 1.0]),
                passage(0, 1, vec![1.0, 0.0]),
                passage(0, 2, vec![1.0, 1.0]),
            ],
        )
        .await
        .unwrap();

    let matches = store.search("c", &[1.0, 0.0], 2).await.unwrap();
    let ids: Vec<&str> = matches.iter().map(|m| m.passage.id.as_str()).collect();
    assert_eq!(ids, ["page_0_chunk_1", "page_0_chunk_2"]);
    assert!(matches[0].distance.abs() < 1e-6);
    assert!(matches.iter().all(|m| m.passage.embedding.is_empty()));
}

#[tokio::test]
async fn duplicate_id_rolls_back_whole_batch() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("s.sqlite")).await.unwrap();
    store.create_collection("c", 2).await.unwrap();
    store.add("c", &[passage(0, 0, vec![1.0, 0.0])]).await.unwrap();

    let result =
        store.add("c", &[passage(1, 0, vec![0.0, 1.0]), passage(0, 0, vec![1.0, 1.0])]).await;
    assert!(matches!(result, Err(RagError::VectorStore { .. })));
    assert_eq!(store.count("c").await.unwrap(), 1);
}

#[tokio::test]
async fn wrong_dimension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("s.sqlite")).await.unwrap();
    store.create_collection("c", 3).await.unwrap();

    let added = store.add("c", &[passage(0, 0, vec![1.0, 0.0])]).await;
    assert!(matches!(added, Err(RagError::DimensionMismatch { expected: 3, actual: 2 })));

    let searched = store.search("c", &[1.0], 1).await;
    assert!(matches!(searched, Err(RagError::DimensionMismatch { expected: 3, actual: 1 })));
}

#[tokio::test]
async fn get_respects_limit_and_missing_collection_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("s.sqlite")).await.unwrap();
    assert_eq!(store.count("nothing").await.unwrap(), 0);
    assert_eq!(store.dimensions("nothing").await.unwrap(), None);

    store.create_collection("c", 1).await.unwrap();
    let batch: Vec<Passage> = (0..5).map(|i| passage(0, i, vec![1.0])).collect();
    store.add("c", &batch).await.unwrap();

    let first_two = store.get("c", Some(2)).await.unwrap();
    assert_eq!(first_two.len(), 2);
    assert_eq!(first_two[1].id, "page_0_chunk_1");
}

#[tokio::test]
async fn delete_collection_removes_passages() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("s.sqlite")).await.unwrap();
    store.create_collection("c", 1).await.unwrap();
    store.add("c", &[passage(0, 0, vec![1.0])]).await.unwrap();

    store.delete_collection("c").await.unwrap();
    assert_eq!(store.count("c").await.unwrap(), 0);
    assert_eq!(store.dimensions("c").await.unwrap(), None);
}
