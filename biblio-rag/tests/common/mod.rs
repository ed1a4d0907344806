//! Shared test doubles for the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use biblio_rag::{Chunk, EmbeddingProvider, EngineError, GenerationProvider, Result};

/// Deterministic embedder: letter-frequency vectors over `a..=z`.
///
/// Counts every `embed` call so tests can assert which paths reached the
/// provider. The `failing` variant simulates an unreachable service.
pub struct FakeEmbedder {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self { calls: AtomicUsize::new(0), fail: false }
    }

    pub fn failing() -> Self {
        Self { calls: AtomicUsize::new(0), fail: true }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EngineError::Embedding {
                provider: "FakeEmbedder".to_string(),
                message: "simulated outage".to_string(),
            });
        }
        Ok(letter_frequencies(text))
    }

    fn dimensions(&self) -> usize {
        26
    }
}

/// Frequency of each ASCII letter in `text`, case-insensitive.
pub fn letter_frequencies(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; 26];
    for c in text.chars().filter(char::is_ascii_alphabetic) {
        vector[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
    }
    vector
}

enum FakeBehavior {
    /// Return the full prompt as the completion.
    Echo,
    /// Return a fixed completion.
    Canned(String),
    /// Fail every request.
    Fail,
}

/// Scripted generation provider with a call counter.
pub struct FakeGenerator {
    behavior: FakeBehavior,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn echo() -> Self {
        Self { behavior: FakeBehavior::Echo, calls: AtomicUsize::new(0) }
    }

    pub fn canned(text: impl Into<String>) -> Self {
        Self { behavior: FakeBehavior::Canned(text.into()), calls: AtomicUsize::new(0) }
    }

    pub fn failing() -> Self {
        Self { behavior: FakeBehavior::Fail, calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for FakeGenerator {
    fn name(&self) -> &str {
        "FakeGenerator"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            FakeBehavior::Echo => Ok(prompt.to_string()),
            FakeBehavior::Canned(text) => Ok(text.clone()),
            FakeBehavior::Fail => Err(EngineError::Generation {
                provider: "FakeGenerator".to_string(),
                message: "simulated outage".to_string(),
            }),
        }
    }
}

/// Build a chunk by hand for index-level tests.
pub fn make_chunk(source: &str, index: usize, text: &str) -> Chunk {
    let mut metadata = HashMap::new();
    metadata.insert("source_path".to_string(), source.to_string());
    metadata.insert("chunk_index".to_string(), index.to_string());
    Chunk { id: format!("{source}#{index}"), text: text.to_string(), metadata }
}
