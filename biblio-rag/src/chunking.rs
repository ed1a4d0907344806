//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`] — splits by character count with configurable overlap
//! - [`RecursiveChunker`] — splits hierarchically by paragraphs, sentences,
//!   then words, falling back to a hard cut; consecutive chunks share
//!   exactly `chunk_overlap` characters
//!
//! Sizes are measured in bytes; every cut lands on a `char` boundary, so a
//! chunk may exceed the limit only when a single code point is wider than
//! the whole budget.

use crate::document::{Chunk, Document, PAGE_KEY, SOURCE_PATH_KEY};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s that inherit the parent document's
/// source metadata. An empty document yields an empty `Vec`.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks, in text order.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into fixed-size chunks with exact overlap carry-over.
///
/// Consecutive full-length chunks share exactly `chunk_overlap` bytes; the
/// final chunk may be shorter. Chunk IDs are generated as
/// `{source_path}#{chunk_index}`.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let pieces = split_by_size(&document.text, self.chunk_size, self.chunk_overlap);
        into_chunks(document, pieces)
    }
}

/// Splits text hierarchically: paragraphs → sentences → words → hard cut.
///
/// Works in two passes. A segmentation pass breaks the text into pieces no
/// longer than `chunk_size - chunk_overlap`, cutting at the coarsest
/// separator that fits (`\n\n`, then `. `/`! `/`? `, then spaces, then a
/// hard cut). A merge pass then packs adjacent pieces into chunks of at
/// most `chunk_size`, seeding each new chunk with the final
/// `chunk_overlap` characters of the chunk before it. Consecutive chunks
/// from one document therefore share exactly `chunk_overlap` characters
/// while still breaking at natural boundaries.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Separator ladder, coarsest first.
    const SEPARATORS: [&'static str; 5] = ["\n\n", ". ", "! ", "? ", " "];

    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }
        // Pieces are sized so that an overlap seed plus any piece still
        // fits within chunk_size.
        let budget = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);
        let pieces = segment(&document.text, budget, &Self::SEPARATORS);
        let merged = merge_with_overlap(pieces, self.chunk_size, self.chunk_overlap);
        into_chunks(document, merged)
    }
}

/// Wrap raw text pieces as [`Chunk`]s carrying the document's source metadata.
fn into_chunks(document: &Document, pieces: Vec<String>) -> Vec<Chunk> {
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let mut metadata = std::collections::HashMap::new();
            metadata.insert(SOURCE_PATH_KEY.to_string(), document.source_path.clone());
            metadata.insert("chunk_index".to_string(), i.to_string());
            if let Some(page) = document.page {
                metadata.insert(PAGE_KEY.to_string(), page.to_string());
            }
            Chunk { id: format!("{}#{i}", document.source_path), text, metadata }
        })
        .collect()
}

/// Segmentation pass: break text into pieces no longer than `budget`,
/// cutting at the coarsest separator that works and hard-cutting as a
/// last resort. Pieces keep their trailing separators, so concatenating
/// them reproduces the text.
fn segment(text: &str, budget: usize, separators: &[&str]) -> Vec<String> {
    if text.len() <= budget {
        return vec![text.to_string()];
    }
    let Some((separator, finer)) = separators.split_first() else {
        return hard_cut(text, budget);
    };

    let mut pieces = Vec::new();
    for part in text.split_inclusive(separator) {
        if part.len() <= budget {
            pieces.push(part.to_string());
        } else {
            pieces.extend(segment(part, budget, finer));
        }
    }
    pieces
}

/// Merge pass: greedily pack pieces into chunks of at most `chunk_size`,
/// seeding each new chunk with the final `chunk_overlap` characters of
/// the chunk just emitted.
fn merge_with_overlap(
    pieces: Vec<String>,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    // Length of the prefix of `current` duplicated from the previous chunk.
    let mut seed_len = 0;

    for piece in pieces {
        if current.len() + piece.len() > chunk_size && current.len() > seed_len {
            let seed = overlap_tail(&current, chunk_overlap).to_string();
            chunks.push(std::mem::replace(&mut current, seed));
            seed_len = current.len();
        }
        current.push_str(&piece);
    }
    if current.len() > seed_len {
        chunks.push(current);
    }
    chunks
}

/// The final `chunk_overlap` characters of a chunk, clamped to a char boundary.
fn overlap_tail(chunk: &str, chunk_overlap: usize) -> &str {
    let start = ceil_boundary(chunk, chunk.len().saturating_sub(chunk_overlap));
    &chunk[start..]
}

/// Lossless hard cut into pieces of at most `budget` characters.
fn hard_cut(text: &str, budget: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = floor_boundary(text, (start + budget).min(text.len()));
        if end <= start {
            // A single code point wider than the budget; take it whole.
            end = ceil_boundary(text, start + 1);
        }
        pieces.push(text[start..end].to_string());
        start = end;
    }
    pieces
}

/// Character-based splitting with overlap, the hard-cut fallback.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = floor_boundary(text, (start + chunk_size).min(text.len()));
        if end <= start {
            // A single code point wider than the budget; take it whole.
            end = ceil_boundary(text, start + 1);
        }
        chunks.push(text[start..end].to_string());
        if end == text.len() {
            break;
        }
        let step = chunk_size.saturating_sub(chunk_overlap);
        if step == 0 {
            break;
        }
        start = ceil_boundary(text, start + step);
    }

    chunks
}

/// Largest char boundary at or below `index`.
fn floor_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary at or above `index`.
fn ceil_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index.min(text.len())
}
