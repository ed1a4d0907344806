//! End-to-end engine scenarios with scripted providers.

mod common;

use std::fs;
use std::sync::Arc;

use biblio_rag::engine::{
    EMPTY_QUESTION_ANSWER, ENGINE_UNAVAILABLE_ANSWER, PROVIDER_FAILURE_ANSWER,
};
use biblio_rag::index::VECTORS_FILE;
use biblio_rag::{Engine, EngineConfig, InitFailure, initialize_with_providers};
use common::{FakeEmbedder, FakeGenerator};
use tempfile::TempDir;

fn test_config(docs: &TempDir, index: &TempDir) -> EngineConfig {
    EngineConfig::builder()
        .docs_dir(docs.path())
        .index_dir(index.path())
        .build()
        .unwrap()
}

#[tokio::test]
async fn answers_from_the_indexed_document() {
    let docs = tempfile::tempdir().unwrap();
    let index = tempfile::tempdir().unwrap();
    fs::write(docs.path().join("hours.txt"), "Library hours are 9 to 5.").unwrap();

    let embedder = Arc::new(FakeEmbedder::new());
    let generator = Arc::new(FakeGenerator::echo());
    let config = test_config(&docs, &index);
    let engine = initialize_with_providers(&config, embedder.clone(), generator.clone()).await;
    assert!(engine.is_ready());

    let answer = engine.answer("What are the library hours?").await;
    assert!(answer.text.contains('9'), "answer should mention opening hour: {}", answer.text);
    assert!(answer.text.contains('5'), "answer should mention closing hour: {}", answer.text);
    assert_eq!(answer.sources.len(), 1);
    assert!(answer.sources[0].source_path().unwrap().ends_with("hours.txt"));
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test]
async fn empty_documents_directory_leaves_engine_unavailable() {
    let docs = tempfile::tempdir().unwrap();
    let index = tempfile::tempdir().unwrap();

    let embedder = Arc::new(FakeEmbedder::new());
    let generator = Arc::new(FakeGenerator::echo());
    let config = test_config(&docs, &index);
    let engine = initialize_with_providers(&config, embedder.clone(), generator.clone()).await;

    assert!(!engine.is_ready());
    match &engine {
        Engine::Unavailable { cause } => assert_eq!(cause, &InitFailure::NoDocuments),
        Engine::Ready(_) => panic!("engine should be unavailable"),
    }
    assert!(engine.status().contains("unavailable"));

    // Queries are rejected before reaching any provider.
    let answer = engine.answer("anything at all").await;
    assert_eq!(answer.text, ENGINE_UNAVAILABLE_ANSWER);
    assert!(answer.sources.is_empty());
    assert_eq!(embedder.call_count(), 0);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn failing_generation_provider_degrades_to_canned_answer() {
    let docs = tempfile::tempdir().unwrap();
    let index = tempfile::tempdir().unwrap();
    fs::write(docs.path().join("hours.txt"), "Library hours are 9 to 5.").unwrap();

    let embedder = Arc::new(FakeEmbedder::new());
    let generator = Arc::new(FakeGenerator::failing());
    let config = test_config(&docs, &index);
    let engine = initialize_with_providers(&config, embedder.clone(), generator.clone()).await;
    assert!(engine.is_ready());

    let answer = engine.answer("What are the library hours?").await;
    assert_eq!(answer.text, PROVIDER_FAILURE_ANSWER);
    assert!(answer.sources.is_empty());
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test]
async fn blank_question_is_rejected_without_provider_calls() {
    let docs = tempfile::tempdir().unwrap();
    let index = tempfile::tempdir().unwrap();
    fs::write(docs.path().join("hours.txt"), "Library hours are 9 to 5.").unwrap();

    let embedder = Arc::new(FakeEmbedder::new());
    let generator = Arc::new(FakeGenerator::echo());
    let config = test_config(&docs, &index);
    let engine = initialize_with_providers(&config, embedder.clone(), generator.clone()).await;
    let calls_after_init = embedder.call_count();

    let answer = engine.answer("   ").await;
    assert_eq!(answer.text, EMPTY_QUESTION_ANSWER);
    assert!(answer.sources.is_empty());
    assert_eq!(embedder.call_count(), calls_after_init);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn failing_embedder_leaves_engine_unavailable_with_build_cause() {
    let docs = tempfile::tempdir().unwrap();
    let index = tempfile::tempdir().unwrap();
    fs::write(docs.path().join("hours.txt"), "Library hours are 9 to 5.").unwrap();

    let embedder = Arc::new(FakeEmbedder::failing());
    let generator = Arc::new(FakeGenerator::echo());
    let config = test_config(&docs, &index);
    let engine = initialize_with_providers(&config, embedder, generator).await;

    match &engine {
        Engine::Unavailable { cause: InitFailure::IndexBuild(detail) } => {
            assert!(detail.contains("Embedding error"), "unexpected cause detail: {detail}");
        }
        _ => panic!("engine should be unavailable with a build failure"),
    }
}

#[tokio::test]
async fn second_startup_reuses_the_persisted_index() {
    let docs = tempfile::tempdir().unwrap();
    let index = tempfile::tempdir().unwrap();
    fs::write(docs.path().join("hours.txt"), "Library hours are 9 to 5.").unwrap();
    let config = test_config(&docs, &index);

    let first_embedder = Arc::new(FakeEmbedder::new());
    let engine =
        initialize_with_providers(&config, first_embedder.clone(), Arc::new(FakeGenerator::echo()))
            .await;
    assert!(engine.is_ready());
    assert!(first_embedder.call_count() > 0);

    // Fresh providers; the index should load from disk without re-embedding.
    let second_embedder = Arc::new(FakeEmbedder::new());
    let engine =
        initialize_with_providers(&config, second_embedder.clone(), Arc::new(FakeGenerator::echo()))
            .await;
    assert!(engine.is_ready());
    assert_eq!(second_embedder.call_count(), 0);
}

#[tokio::test]
async fn corrupt_persisted_index_is_rebuilt_on_startup() {
    let docs = tempfile::tempdir().unwrap();
    let index = tempfile::tempdir().unwrap();
    fs::write(docs.path().join("hours.txt"), "Library hours are 9 to 5.").unwrap();
    let config = test_config(&docs, &index);

    let engine = initialize_with_providers(
        &config,
        Arc::new(FakeEmbedder::new()),
        Arc::new(FakeGenerator::echo()),
    )
    .await;
    assert!(engine.is_ready());

    fs::write(index.path().join(VECTORS_FILE), b"scrambled").unwrap();

    let embedder = Arc::new(FakeEmbedder::new());
    let engine =
        initialize_with_providers(&config, embedder.clone(), Arc::new(FakeGenerator::echo())).await;
    assert!(engine.is_ready());
    assert!(embedder.call_count() > 0, "corrupt index should force a rebuild");
}
