//! Engine assembly: the startup sequence and the query orchestrator.
//!
//! [`initialize`] runs once per process, before any query is accepted:
//! it validates the credential, constructs both providers, loads the
//! persisted index or rebuilds it from the documents directory, and
//! returns an [`Engine`] that is either `Ready` or `Unavailable` with a
//! named cause. It never fails; every failure path degrades to
//! `Unavailable` so sibling features of the host keep working.
//!
//! Queries go through [`Engine::answer`], which is infallible at the
//! boundary: provider failures and rejected questions come back as
//! canned answer text with no sources, never as errors.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::EngineConfig;
use crate::document::{Answer, Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::generation::GenerationProvider;
use crate::index::VectorIndex;
use crate::loader::load_documents;
use crate::openai::{OpenAIChatProvider, OpenAIEmbeddingProvider, api_key_from_env};

/// Canned response for a blank question.
pub const EMPTY_QUESTION_ANSWER: &str = "Please enter a question.";

/// Canned response when retrieval finds nothing.
pub const NO_CONTEXT_ANSWER: &str =
    "I could not find any passages relevant to that question in the document collection.";

/// Canned response for a provider failure during a query.
pub const PROVIDER_FAILURE_ANSWER: &str =
    "Sorry, something went wrong while answering your question. Please try again later.";

/// Canned response when the engine never became ready.
pub const ENGINE_UNAVAILABLE_ANSWER: &str =
    "The question-answering engine is not available right now.";

/// Why the engine came up unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitFailure {
    /// The API credential is missing, empty, or still the placeholder.
    MissingCredential(String),
    /// A provider could not be constructed.
    Provider(String),
    /// The documents directory produced no loadable documents.
    NoDocuments,
    /// Documents loaded but chunking produced nothing to index.
    NoChunks,
    /// The index could not be built or persisted.
    IndexBuild(String),
}

impl fmt::Display for InitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential(detail) => write!(f, "credential not configured: {detail}"),
            Self::Provider(detail) => write!(f, "provider construction failed: {detail}"),
            Self::NoDocuments => write!(f, "no documents found in the documents directory"),
            Self::NoChunks => write!(f, "documents could not be split into chunks"),
            Self::IndexBuild(detail) => write!(f, "index build failed: {detail}"),
        }
    }
}

/// The ready-to-query orchestrator.
///
/// Holds the built index and both providers; queries are `&self`,
/// stateless, and safe to run concurrently since the index is read-only
/// at query time.
pub struct QueryEngine {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    top_k: usize,
}

impl QueryEngine {
    /// Assemble an orchestrator from a built index and providers.
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        top_k: usize,
    ) -> Self {
        Self { index, embedder, generator, top_k }
    }

    /// Number of chunks in the underlying index.
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    /// Answer a question from the indexed documents.
    ///
    /// Retrieves the `top_k` most relevant chunks, assembles a grounded
    /// prompt, and returns the generated answer with its sources. Blank
    /// questions and provider failures come back as canned answers with
    /// no sources.
    pub async fn answer(&self, question: &str) -> Answer {
        let question = question.trim();
        if question.is_empty() {
            return Answer::without_sources(EMPTY_QUESTION_ANSWER);
        }

        let query_vector = match self.embedder.embed(question).await {
            Ok(vector) => vector,
            Err(e) => {
                error!(error = %e, "query embedding failed");
                return Answer::without_sources(PROVIDER_FAILURE_ANSWER);
            }
        };

        let results = self.index.search(&query_vector, self.top_k);
        if results.is_empty() {
            info!("no relevant chunks for question");
            return Answer::without_sources(NO_CONTEXT_ANSWER);
        }

        let prompt = build_prompt(question, &results);
        match self.generator.generate(&prompt).await {
            Ok(text) => {
                info!(source_count = results.len(), "answered question");
                let sources: Vec<Chunk> = results.into_iter().map(|r| r.chunk).collect();
                Answer { text, sources }
            }
            Err(e) => {
                error!(error = %e, "answer generation failed");
                Answer::without_sources(PROVIDER_FAILURE_ANSWER)
            }
        }
    }
}

/// Assemble the grounded prompt: numbered context passages, then the
/// question, with an instruction to stay within the context.
fn build_prompt(question: &str, results: &[SearchResult]) -> String {
    let mut prompt = String::from(
        "Answer the question using only the context passages below. \
         If the context does not contain the answer, say that you cannot \
         find it in the provided documents.\n\n",
    );
    for (i, result) in results.iter().enumerate() {
        prompt.push_str(&format!("Context {}:\n{}\n\n", i + 1, result.chunk.text));
    }
    prompt.push_str(&format!("Question: {question}\nAnswer:"));
    prompt
}

/// The engine handle held by the presentation layer.
///
/// Either a ready orchestrator or an unavailable marker with its cause.
/// Both variants accept [`answer`](Engine::answer); an unavailable engine
/// rejects the question without touching any provider.
pub enum Engine {
    /// The engine initialized and accepts queries.
    Ready(QueryEngine),
    /// Initialization failed; queries are rejected.
    Unavailable {
        /// The specific initialization failure.
        cause: InitFailure,
    },
}

impl Engine {
    /// Readiness query for the presentation layer.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Human-readable status line for observability.
    pub fn status(&self) -> String {
        match self {
            Self::Ready(engine) => format!("ready ({} chunks indexed)", engine.chunk_count()),
            Self::Unavailable { cause } => format!("unavailable: {cause}"),
        }
    }

    /// Answer a question, or reject it if the engine is unavailable.
    pub async fn answer(&self, question: &str) -> Answer {
        match self {
            Self::Ready(engine) => engine.answer(question).await,
            Self::Unavailable { cause } => {
                warn!(%cause, "query rejected: engine unavailable");
                Answer::without_sources(ENGINE_UNAVAILABLE_ANSWER)
            }
        }
    }
}

/// One-shot startup sequence using OpenAI providers configured from the
/// environment.
///
/// Await this once at process start, before accepting queries. Never
/// fails: configuration and build problems produce an
/// [`Engine::Unavailable`] with a named cause instead.
pub async fn initialize(config: &EngineConfig) -> Engine {
    let api_key = match api_key_from_env() {
        Ok(key) => key,
        Err(e) => {
            warn!(error = %e, "engine unavailable");
            return Engine::Unavailable { cause: InitFailure::MissingCredential(e.to_string()) };
        }
    };

    let embedder = match OpenAIEmbeddingProvider::new(api_key.clone(), config.request_timeout) {
        Ok(provider) => provider.with_model(config.embedding_model.clone()),
        Err(e) => {
            warn!(error = %e, "engine unavailable");
            return Engine::Unavailable { cause: InitFailure::Provider(e.to_string()) };
        }
    };
    let generator = match OpenAIChatProvider::new(api_key, config.request_timeout) {
        Ok(provider) => provider.with_model(config.chat_model.clone()),
        Err(e) => {
            warn!(error = %e, "engine unavailable");
            return Engine::Unavailable { cause: InitFailure::Provider(e.to_string()) };
        }
    };

    initialize_with_providers(config, Arc::new(embedder), Arc::new(generator)).await
}

/// Startup sequence with explicitly injected providers.
///
/// Loads the persisted index if its artifacts are present and consistent
/// with the embedder's dimensionality; otherwise rebuilds it from the
/// documents directory and persists the result. Every failure path
/// degrades to [`Engine::Unavailable`] with a distinct cause.
pub async fn initialize_with_providers(
    config: &EngineConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
) -> Engine {
    let index = match VectorIndex::load(&config.index_dir, embedder.dimensions()).await {
        Some(index) => index,
        None => {
            info!(docs_dir = %config.docs_dir.display(), "no usable persisted index; building from documents");
            let documents = load_documents(&config.docs_dir).await;
            if documents.is_empty() {
                warn!(docs_dir = %config.docs_dir.display(), "engine unavailable: no documents");
                return Engine::Unavailable { cause: InitFailure::NoDocuments };
            }

            let chunker = RecursiveChunker::new(config.chunk_size, config.chunk_overlap);
            let chunks: Vec<Chunk> =
                documents.iter().flat_map(|document| chunker.chunk(document)).collect();
            if chunks.is_empty() {
                warn!("engine unavailable: documents produced no chunks");
                return Engine::Unavailable { cause: InitFailure::NoChunks };
            }

            let index = match VectorIndex::build(chunks, embedder.as_ref()).await {
                Ok(index) => index,
                Err(e) => {
                    error!(error = %e, "engine unavailable: index build failed");
                    return Engine::Unavailable { cause: InitFailure::IndexBuild(e.to_string()) };
                }
            };
            if let Err(e) = index.persist(&config.index_dir).await {
                error!(error = %e, "engine unavailable: index persist failed");
                return Engine::Unavailable { cause: InitFailure::IndexBuild(e.to_string()) };
            }
            index
        }
    };

    info!(chunk_count = index.len(), "engine ready");
    Engine::Ready(QueryEngine::new(Arc::new(index), embedder, generator, config.top_k))
}
