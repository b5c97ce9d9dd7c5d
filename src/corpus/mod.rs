//! Corpus ingestion
//!
//! Discovers source documents under the corpus directory and extracts their
//! plain text. Plain-text formats are read directly; PDFs go through the
//! `pdftotext` tool so no PDF parser is linked into the binary.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use walkdir::WalkDir;

pub mod segmenter;

pub use segmenter::{segment_words, WordChunks};

/// File extensions picked up by corpus discovery
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "pdf"];

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unsupported file type: {path:?}")]
    UnsupportedType { path: PathBuf },

    #[error("PDF extraction failed for {path:?}: {message}")]
    PdfExtraction { path: PathBuf, message: String },

    #[error("Corpus scan failed: {0}")]
    Scan(#[from] walkdir::Error),
}

/// Extracts plain text from a document on disk
///
/// Indexing takes this as a trait object so tests can substitute loaders
/// that fail on demand.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<String, IngestError>;
}

/// Loader for the supported on-disk formats
pub struct FileLoader;

impl DocumentLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<String, IngestError> {
        match extension_of(path).as_deref() {
            Some("txt") | Some("md") | Some("markdown") => {
                std::fs::read_to_string(path).map_err(|e| IngestError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
            Some("pdf") => extract_pdf_text(path),
            _ => Err(IngestError::UnsupportedType {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Extract text from a PDF via the `pdftotext` command
///
/// `-` sends the extracted text to stdout.
fn extract_pdf_text(path: &Path) -> Result<String, IngestError> {
    let output = Command::new("pdftotext")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| IngestError::PdfExtraction {
            path: path.to_path_buf(),
            message: format!("failed to run pdftotext: {}", e),
        })?;

    if !output.status.success() {
        return Err(IngestError::PdfExtraction {
            path: path.to_path_buf(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Find all supported documents under `dir`, in a stable order
///
/// Walks recursively and sorts by file name so repeated builds over the same
/// corpus assign the same chunk ids.
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if let Some(ext) = extension_of(path) {
            if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
                documents.push(path.to_path_buf());
            }
        }
    }

    Ok(documents)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
