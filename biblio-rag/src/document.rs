//! Data types for documents, chunks, and query results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key under which every chunk records its originating file.
pub const SOURCE_PATH_KEY: &str = "source_path";

/// Metadata key for the page number of paginated source formats.
pub const PAGE_KEY: &str = "page";

/// A raw ingested document.
///
/// Produced by the loader and discarded once chunked; documents are never
/// persisted on their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Path of the source file, unique per file.
    pub source_path: String,
    /// The full text content of the document.
    pub text: String,
    /// Page number for paginated formats, `None` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl Document {
    /// Create a document with no page number.
    pub fn new(source_path: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source_path: source_path.into(), text: text.into(), page: None }
    }
}

/// A segment of a [`Document`], the unit of embedding and retrieval.
///
/// The chunk's vector lives in the index, order-aligned with the chunk
/// store; chunks themselves carry only text and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `{source_path}#{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Metadata inherited from the parent document plus chunk-specific fields.
    /// Always contains [`SOURCE_PATH_KEY`].
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// The originating file recorded in this chunk's metadata.
    pub fn source_path(&self) -> Option<&str> {
        self.metadata.get(SOURCE_PATH_KEY).map(String::as_str)
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// The engine's response to a single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The generated answer text.
    pub text: String,
    /// The chunks the answer was grounded on, most relevant first.
    /// Empty when the engine could not answer.
    pub sources: Vec<Chunk>,
}

impl Answer {
    /// An answer with no supporting sources.
    pub(crate) fn without_sources(text: impl Into<String>) -> Self {
        Self { text: text.into(), sources: Vec::new() }
    }
}
