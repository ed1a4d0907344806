//! Error types for the `biblio-rag` crate.

use thiserror::Error;

/// Errors that can occur in engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid configuration, including a missing or placeholder credential.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An index build was requested with zero chunks.
    #[error("cannot build an index from an empty chunk set")]
    EmptyIndexInput,

    /// An error occurred in the embedding service.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the generation service.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An index consistency or persistence failure.
    #[error("Index error: {0}")]
    Index(String),
}

/// A convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
