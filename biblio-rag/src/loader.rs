//! Document ingestion from a directory tree.
//!
//! [`load_documents`] scans a root directory recursively for supported
//! file types (`.txt`, `.pdf`) and reads each into a [`Document`]. A file
//! that cannot be read or parsed is skipped with a warning; partial
//! ingestion is preferable to none. The function never fails: callers
//! must treat an empty result as "no index can be built".

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::Document;

/// Maximum number of files read concurrently. Results keep scan order.
const LOAD_CONCURRENCY: usize = 8;

/// Supported source file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Text,
    Pdf,
}

impl FileKind {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("txt") {
            Some(Self::Text)
        } else if ext.eq_ignore_ascii_case("pdf") {
            Some(Self::Pdf)
        } else {
            None
        }
    }
}

/// Load every supported document under `root`, in sorted path order.
///
/// Returns an empty `Vec` when the directory is missing, empty, or
/// contains nothing readable.
pub async fn load_documents(root: impl AsRef<Path>) -> Vec<Document> {
    let root = root.as_ref();
    if !root.is_dir() {
        warn!(root = %root.display(), "documents directory does not exist");
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| FileKind::from_path(entry.path()).is_some())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    for kind in [FileKind::Text, FileKind::Pdf] {
        if !files.iter().any(|p| FileKind::from_path(p) == Some(kind)) {
            warn!(root = %root.display(), ?kind, "no documents of this type found");
        }
    }

    let documents: Vec<Document> = stream::iter(files)
        .map(load_file)
        .buffered(LOAD_CONCURRENCY)
        .collect::<Vec<Option<Document>>>()
        .await
        .into_iter()
        .flatten()
        .collect();

    if documents.is_empty() {
        warn!(root = %root.display(), "no documents could be loaded");
    } else {
        info!(count = documents.len(), root = %root.display(), "loaded documents");
    }
    documents
}

/// Read one file into a [`Document`], or `None` if it cannot be ingested.
async fn load_file(path: PathBuf) -> Option<Document> {
    let kind = FileKind::from_path(&path)?;
    let text = match kind {
        FileKind::Text => match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable text file");
                return None;
            }
        },
        FileKind::Pdf => {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping unreadable PDF file");
                    return None;
                }
            };
            // pdf text extraction is CPU-bound
            let extracted =
                match spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await {
                    Ok(result) => result,
                    Err(error) => {
                        warn!(path = %path.display(), %error, "PDF extraction task failed");
                        return None;
                    }
                };
            match extracted {
                Ok(text) => text,
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping unparseable PDF file");
                    return None;
                }
            }
        }
    };

    if text.trim().is_empty() {
        debug!(path = %path.display(), "skipping file with no extractable text");
        return None;
    }

    Some(Document::new(path.display().to_string(), text))
}
