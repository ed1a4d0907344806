//! Persistent vector index: build, persist, load, and similarity search.
//!
//! The index is rebuilt wholesale from a chunk set and never mutated
//! incrementally. On disk it is two co-located artifacts: a bincode file
//! holding the vectors behind a format-version tag, and a JSON chunk
//! store. Both must be present and mutually consistent for a load to
//! succeed; any other state is treated as absent and the caller rebuilds.

use std::cmp::Ordering;
use std::path::Path;

use bincode::config::standard as bincode_config;
use bincode::{Decode, Encode, decode_from_slice, encode_to_vec};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{EngineError, Result};

/// File name of the serialized vector artifact.
pub const VECTORS_FILE: &str = "index.bin";

/// File name of the chunk store artifact.
pub const CHUNKS_FILE: &str = "chunks.json";

/// Version tag embedded in the vector artifact; bumped on layout changes.
const FORMAT_VERSION: u32 = 1;

/// Number of chunk texts sent to the embedding provider per request.
const EMBED_BATCH_SIZE: usize = 64;

/// On-disk layout of the vector artifact.
#[derive(Encode, Decode)]
struct VectorArtifact {
    version: u32,
    dimensions: u32,
    vectors: Vec<Vec<f32>>,
}

/// A nearest-neighbor index over chunk embeddings.
///
/// Vectors and chunks are parallel arrays: `vectors[i]` is the embedding
/// of `chunks[i]`. The invariant `vectors.len() == chunks.len()` is
/// established by [`build`](VectorIndex::build) and re-checked by
/// [`load`](VectorIndex::load).
pub struct VectorIndex {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
}

impl VectorIndex {
    /// Embed every chunk and construct the index in memory.
    ///
    /// Embedding runs in order-preserving batches of 64.
    ///
    /// # Errors
    ///
    /// - [`EngineError::EmptyIndexInput`] when `chunks` is empty
    /// - [`EngineError::Embedding`] when the provider fails
    /// - [`EngineError::Index`] when the provider returns the wrong number
    ///   of vectors or a vector of the wrong dimensionality
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn EmbeddingProvider) -> Result<Self> {
        if chunks.is_empty() {
            return Err(EngineError::EmptyIndexInput);
        }

        let dimensions = embedder.dimensions();
        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embedded = embedder.embed_batch(&texts).await?;
            if embedded.len() != batch.len() {
                return Err(EngineError::Index(format!(
                    "embedding provider returned {} vectors for {} chunks",
                    embedded.len(),
                    batch.len()
                )));
            }
            vectors.extend(embedded);
        }

        if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
            return Err(EngineError::Index(format!(
                "embedding provider returned a {}-dimensional vector, expected {dimensions}",
                bad.len()
            )));
        }

        info!(chunk_count = chunks.len(), dimensions, "built vector index");
        Ok(Self { dimensions, vectors, chunks })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Dimensionality of the stored vectors.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Return at most `k` chunks nearest to `query` by cosine similarity,
    /// descending. An empty index yields an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchResult> {
        let mut scored: Vec<SearchResult> = self
            .vectors
            .iter()
            .zip(&self.chunks)
            .map(|(vector, chunk)| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(vector, query),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Serialize the index into `dir` as its two artifacts.
    ///
    /// Each artifact is written to a temporary sibling and renamed into
    /// place, so a failed persist leaves any previous on-disk index
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Index`] on serialization or filesystem
    /// failure.
    pub async fn persist(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| EngineError::Index(format!("failed to create {}: {e}", dir.display())))?;

        let artifact = VectorArtifact {
            version: FORMAT_VERSION,
            dimensions: self.dimensions as u32,
            vectors: self.vectors.clone(),
        };
        let vector_bytes = spawn_blocking(move || encode_to_vec(&artifact, bincode_config()))
            .await
            .map_err(|e| EngineError::Index(format!("serialization task failed: {e}")))?
            .map_err(|e| EngineError::Index(format!("failed to serialize vectors: {e}")))?;
        let chunk_bytes = serde_json::to_vec(&self.chunks)
            .map_err(|e| EngineError::Index(format!("failed to serialize chunk store: {e}")))?;

        let vectors_path = dir.join(VECTORS_FILE);
        let chunks_path = dir.join(CHUNKS_FILE);
        let vectors_tmp = dir.join(format!("{VECTORS_FILE}.tmp"));
        let chunks_tmp = dir.join(format!("{CHUNKS_FILE}.tmp"));

        write_file(&vectors_tmp, &vector_bytes).await?;
        write_file(&chunks_tmp, &chunk_bytes).await?;
        rename_file(&vectors_tmp, &vectors_path).await?;
        rename_file(&chunks_tmp, &chunks_path).await?;

        info!(
            chunk_count = self.chunks.len(),
            dir = %dir.display(),
            "persisted vector index"
        );
        Ok(())
    }

    /// Load a persisted index from `dir`.
    ///
    /// Returns `None` when no index has been persisted yet (either
    /// artifact missing) and also when the artifacts are unusable: a
    /// parse failure, a format-version or dimensionality mismatch, or
    /// disagreeing vector and chunk counts. Corruption is logged, never
    /// propagated; the caller's recovery is a rebuild.
    pub async fn load(dir: &Path, expected_dimensions: usize) -> Option<Self> {
        let vectors_path = dir.join(VECTORS_FILE);
        let chunks_path = dir.join(CHUNKS_FILE);
        if !vectors_path.exists() || !chunks_path.exists() {
            debug!(dir = %dir.display(), "no persisted index found");
            return None;
        }

        let vector_bytes = match tokio::fs::read(&vectors_path).await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(path = %vectors_path.display(), %error, "failed to read vector artifact");
                return None;
            }
        };
        let chunk_bytes = match tokio::fs::read(&chunks_path).await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(path = %chunks_path.display(), %error, "failed to read chunk store");
                return None;
            }
        };

        let decoded = spawn_blocking(move || {
            decode_from_slice::<VectorArtifact, _>(&vector_bytes, bincode_config())
        })
        .await;
        let artifact = match decoded {
            Ok(Ok((artifact, _))) => artifact,
            Ok(Err(error)) => {
                warn!(%error, "vector artifact is corrupt; index will be rebuilt");
                return None;
            }
            Err(error) => {
                warn!(%error, "deserialization task failed; index will be rebuilt");
                return None;
            }
        };

        if artifact.version != FORMAT_VERSION {
            warn!(
                found = artifact.version,
                expected = FORMAT_VERSION,
                "vector artifact has an unsupported format version; index will be rebuilt"
            );
            return None;
        }
        let dimensions = artifact.dimensions as usize;
        if dimensions != expected_dimensions {
            warn!(
                found = dimensions,
                expected = expected_dimensions,
                "persisted index was built with a different embedding dimensionality; index will be rebuilt"
            );
            return None;
        }

        let chunks: Vec<Chunk> = match serde_json::from_slice(&chunk_bytes) {
            Ok(chunks) => chunks,
            Err(error) => {
                warn!(%error, "chunk store is corrupt; index will be rebuilt");
                return None;
            }
        };

        if artifact.vectors.len() != chunks.len()
            || artifact.vectors.iter().any(|v| v.len() != dimensions)
        {
            warn!(
                vector_count = artifact.vectors.len(),
                chunk_count = chunks.len(),
                "persisted artifacts are inconsistent; index will be rebuilt"
            );
            return None;
        }

        info!(chunk_count = chunks.len(), dir = %dir.display(), "loaded vector index");
        Some(Self { dimensions, vectors: artifact.vectors, chunks })
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| EngineError::Index(format!("failed to write {}: {e}", path.display())))
}

async fn rename_file(from: &Path, to: &Path) -> Result<()> {
    tokio::fs::rename(from, to)
        .await
        .map_err(|e| EngineError::Index(format!("failed to move {} into place: {e}", from.display())))
}
