//! Vector index tests: search ordering, persistence round-trip, and
//! recovery behavior for missing or corrupt artifacts.

mod common;

use biblio_rag::index::{CHUNKS_FILE, VECTORS_FILE};
use biblio_rag::{Chunk, EmbeddingProvider, EngineError, VectorIndex};
use common::{FakeEmbedder, letter_frequencies, make_chunk};
use proptest::prelude::*;

fn sample_chunks() -> Vec<Chunk> {
    vec![
        make_chunk("hours.txt", 0, "Library hours are 9 to 5."),
        make_chunk("fees.txt", 0, "Late fees are fifty cents per day."),
        make_chunk("rooms.txt", 0, "Study rooms can be booked online."),
    ]
}

#[tokio::test]
async fn build_rejects_empty_chunk_set() {
    let embedder = FakeEmbedder::new();
    let result = VectorIndex::build(Vec::new(), &embedder).await;
    assert!(matches!(result, Err(EngineError::EmptyIndexInput)));
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn build_surfaces_embedding_failure() {
    let embedder = FakeEmbedder::failing();
    let result = VectorIndex::build(sample_chunks(), &embedder).await;
    assert!(matches!(result, Err(EngineError::Embedding { .. })));
}

#[tokio::test]
async fn search_ranks_the_matching_chunk_first() {
    let embedder = FakeEmbedder::new();
    let index = VectorIndex::build(sample_chunks(), &embedder).await.unwrap();

    let query = letter_frequencies("What are the library hours?");
    let results = index.search(&query, 2);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.source_path(), Some("hours.txt"));
    assert!(results[0].score >= results[1].score);
}

#[tokio::test]
async fn persisted_index_round_trips_search_results() {
    let embedder = FakeEmbedder::new();
    let index = VectorIndex::build(sample_chunks(), &embedder).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    index.persist(dir.path()).await.unwrap();
    let loaded = VectorIndex::load(dir.path(), embedder.dimensions())
        .await
        .expect("persisted index should load");

    let query = letter_frequencies("booking a study room");
    let original = index.search(&query, 3);
    let reloaded = loaded.search(&query, 3);

    assert_eq!(original.len(), reloaded.len());
    for (a, b) in original.iter().zip(&reloaded) {
        assert_eq!(a.chunk, b.chunk);
        assert!((a.score - b.score).abs() < 1e-6);
    }
}

#[tokio::test]
async fn load_returns_none_when_nothing_persisted() {
    let dir = tempfile::tempdir().unwrap();
    assert!(VectorIndex::load(dir.path(), 26).await.is_none());
}

#[tokio::test]
async fn load_treats_a_single_artifact_as_absent() {
    let embedder = FakeEmbedder::new();
    let index = VectorIndex::build(sample_chunks(), &embedder).await.unwrap();

    for missing in [VECTORS_FILE, CHUNKS_FILE] {
        let dir = tempfile::tempdir().unwrap();
        index.persist(dir.path()).await.unwrap();
        std::fs::remove_file(dir.path().join(missing)).unwrap();
        assert!(VectorIndex::load(dir.path(), embedder.dimensions()).await.is_none());
    }
}

#[tokio::test]
async fn load_treats_garbage_artifacts_as_absent() {
    let embedder = FakeEmbedder::new();
    let index = VectorIndex::build(sample_chunks(), &embedder).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    index.persist(dir.path()).await.unwrap();
    std::fs::write(dir.path().join(VECTORS_FILE), b"truncated").unwrap();
    assert!(VectorIndex::load(dir.path(), embedder.dimensions()).await.is_none());

    let dir = tempfile::tempdir().unwrap();
    index.persist(dir.path()).await.unwrap();
    std::fs::write(dir.path().join(CHUNKS_FILE), b"{not json").unwrap();
    assert!(VectorIndex::load(dir.path(), embedder.dimensions()).await.is_none());
}

#[tokio::test]
async fn load_rejects_a_dimension_mismatch() {
    let embedder = FakeEmbedder::new();
    let index = VectorIndex::build(sample_chunks(), &embedder).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    index.persist(dir.path()).await.unwrap();
    assert!(VectorIndex::load(dir.path(), 13).await.is_none());
}

/// Mirror of the on-disk vector artifact layout, for writing test fixtures.
#[derive(bincode::Encode)]
struct ArtifactMirror {
    version: u32,
    dimensions: u32,
    vectors: Vec<Vec<f32>>,
}

fn write_artifact(dir: &std::path::Path, artifact: &ArtifactMirror, chunks_json: &[u8]) {
    let bytes = bincode::encode_to_vec(artifact, bincode::config::standard()).unwrap();
    std::fs::write(dir.join(VECTORS_FILE), bytes).unwrap();
    std::fs::write(dir.join(CHUNKS_FILE), chunks_json).unwrap();
}

#[tokio::test]
async fn search_on_an_empty_index_returns_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_artifact(
        dir.path(),
        &ArtifactMirror { version: 1, dimensions: 26, vectors: Vec::new() },
        b"[]",
    );

    let index = VectorIndex::load(dir.path(), 26).await.expect("empty index should load");
    assert!(index.is_empty());
    assert!(index.search(&letter_frequencies("anything"), 4).is_empty());
}

#[tokio::test]
async fn load_rejects_an_unknown_format_version() {
    let dir = tempfile::tempdir().unwrap();
    write_artifact(
        dir.path(),
        &ArtifactMirror { version: 99, dimensions: 26, vectors: Vec::new() },
        b"[]",
    );

    assert!(VectorIndex::load(dir.path(), 26).await.is_none());
}

mod prop_search_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Search results come back in descending score order, bounded by
        /// `top_k` and the corpus size.
        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            texts in proptest::collection::vec("[a-z]{2,10}( [a-z]{2,10}){0,4}", 1..15),
            query in "[a-z ]{1,30}",
            top_k in 1usize..20,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let chunks: Vec<Chunk> = texts
                    .iter()
                    .enumerate()
                    .map(|(i, text)| make_chunk("corpus.txt", i, text))
                    .collect();
                let embedder = FakeEmbedder::new();
                let index = VectorIndex::build(chunks, &embedder).await.unwrap();
                index.search(&letter_frequencies(&query), top_k)
            });

            prop_assert!(results.len() <= top_k);
            prop_assert!(results.len() <= texts.len());
            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}
