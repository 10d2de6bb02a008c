//! Property tests for in-memory vector store search ordering.

use std::collections::HashSet;

use pdfqa_rag::document::{Passage, PassageMetadata};
use pdfqa_rag::inmemory::InMemoryVectorStore;
use pdfqa_rag::vectorstore::VectorStore;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a passage at a random location with a normalized embedding.
fn arb_passage(dim: usize) -> impl Strategy<Value = Passage> {
    (0u32..10, 0u32..10, "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(page, chunk, text, embedding)| {
            Passage::new(PassageMetadata::new(page, chunk), text).with_embedding(embedding)
        },
    )
}

/// Searching returns matches ordered by ascending cosine distance, never more
/// than `top_k`, never more than stored, and without embeddings attached.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_by_distance_and_bounded_by_top_k(
            passages in proptest::collection::vec(arb_passage(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            // Passage ids derive from location, so drop repeated locations.
            let mut seen = HashSet::new();
            let unique: Vec<Passage> =
                passages.into_iter().filter(|p| seen.insert(p.id.clone())).collect();
            let stored = unique.len();

            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.create_collection("test", DIM).await.unwrap();
                store.add("test", &unique).await.unwrap();
                store.search("test", &query, top_k).await.unwrap()
            });

            prop_assert_eq!(results.len(), top_k.min(stored));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].distance <= window[1].distance,
                    "results not in ascending distance: {} > {}",
                    window[0].distance,
                    window[1].distance,
                );
            }
            for m in &results {
                prop_assert!(m.passage.embedding.is_empty());
                prop_assert!((-1e-5..=2.0 + 1e-5).contains(&m.distance));
            }
        }
    }
}

/// Chunking the same pages twice yields identical ids.
mod prop_chunk_ids_are_deterministic {
    use pdfqa_rag::chunking::{Chunker, ParagraphChunker};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn same_input_same_ids(pages in proptest::collection::vec("[a-z \n]{0,200}", 0..6)) {
            let chunker = ParagraphChunker::default();
            let first: Vec<String> = chunker.chunk(&pages).into_iter().map(|p| p.id).collect();
            let second: Vec<String> = chunker.chunk(&pages).into_iter().map(|p| p.id).collect();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn every_passage_clears_the_threshold(
            pages in proptest::collection::vec("[a-z \n]{0,200}", 0..6),
        ) {
            for passage in ParagraphChunker::new(50).chunk(&pages) {
                prop_assert!(passage.text.chars().count() > 50);
                prop_assert_eq!(passage.text.trim(), passage.text.as_str());
            }
        }
    }
}
