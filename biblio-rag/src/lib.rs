//! # biblio-rag
//!
//! Retrieval-augmented question answering over a local document collection.
//!
//! ## Overview
//!
//! The engine ingests a directory of `.txt` and `.pdf` documents, splits
//! them into overlapping chunks, embeds the chunks into a vector space,
//! and answers questions by retrieving the most relevant chunks and
//! handing them to a generation model together with the question. The
//! index is persisted to disk and reloaded on later startups; a missing
//! or unusable persisted index triggers a rebuild from the documents.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use biblio_rag::{EngineConfig, initialize};
//!
//! # async fn run() {
//! let config = EngineConfig::builder()
//!     .docs_dir("data/documents")
//!     .index_dir("vector_store")
//!     .build()
//!     .expect("valid configuration");
//!
//! // Requires OPENAI_API_KEY in the environment.
//! let engine = initialize(&config).await;
//! println!("{}", engine.status());
//!
//! let answer = engine.answer("What are the library hours?").await;
//! println!("{}", answer.text);
//! for chunk in &answer.sources {
//!     println!("source: {}", chunk.source_path().unwrap_or("unknown"));
//! }
//! # }
//! ```
//!
//! ## Failure model
//!
//! [`initialize`] never fails; it returns an [`Engine`] that is `Ready`
//! or `Unavailable` with a named cause, so the host application keeps
//! running with the feature degraded. [`Engine::answer`] never fails
//! either: blank questions, retrieval misses, and provider outages come
//! back as canned answer text with an empty source list.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod generation;
pub mod index;
pub mod loader;
pub mod openai;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::{EngineConfig, EngineConfigBuilder};
pub use document::{Answer, Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use engine::{Engine, InitFailure, QueryEngine, initialize, initialize_with_providers};
pub use error::{EngineError, Result};
pub use generation::{GenerationProvider, summarize};
pub use index::VectorIndex;
pub use loader::load_documents;
pub use openai::{OpenAIChatProvider, OpenAIEmbeddingProvider, api_key_from_env};
