//! Index building
//!
//! The offline half of the pipeline: discover documents, segment them into
//! word chunks, embed every chunk, and persist the three artifacts the
//! query path loads (vector index, chunk store, build manifest).

use crate::config::Config;
use crate::corpus::{discover_documents, segment_words, DocumentLoader};
use crate::embedding::EmbeddingProvider;
use crate::error::{LecternError, Result};
use crate::index::FlatIndex;
use crate::store::ChunkStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const INDEX_FILE: &str = "vectors.bin";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Record of how an index was built
///
/// The query path refuses artifacts whose manifest disagrees with the
/// configured embedding model; distances between vectors from different
/// models are meaningless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Embedding model that produced the vectors
    pub model: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Words per chunk used during segmentation
    pub chunk_size: usize,
    /// Documents successfully indexed
    pub document_count: usize,
    /// Total chunks across all documents
    pub chunk_count: usize,
    /// RFC 3339 build timestamp
    pub built_at: String,
}

impl BuildManifest {
    /// Save the manifest as JSON (atomic: temp file + rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| LecternError::Json {
            source: e,
            context: "Failed to serialize build manifest".to_string(),
        })?;

        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, json).map_err(|e| LecternError::Io {
            source: e,
            context: format!("Failed to write manifest to {:?}", temp_path),
        })?;
        std::fs::rename(&temp_path, path).map_err(|e| LecternError::Io {
            source: e,
            context: format!("Failed to move manifest into place at {:?}", path),
        })?;

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LecternError::Io {
            source: e,
            context: format!("Failed to read manifest from {:?}", path),
        })?;

        serde_json::from_str(&content).map_err(|e| LecternError::Json {
            source: e,
            context: format!("Failed to parse manifest at {:?}", path),
        })
    }
}

/// Summary of one index build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub documents_indexed: usize,
    pub documents_skipped: usize,
    pub chunk_count: usize,
    pub dimension: usize,
}

/// Check whether a complete set of artifacts exists in `dir`
pub fn artifacts_exist(dir: &Path) -> bool {
    dir.join(INDEX_FILE).exists()
        && dir.join(CHUNKS_FILE).exists()
        && dir.join(MANIFEST_FILE).exists()
}

/// Build index artifacts for the configured corpus
///
/// Documents that fail to load, or that yield no words at all, are skipped
/// with a warning; one bad file never aborts the build. An empty corpus
/// produces valid empty artifacts.
/// The manifest is written last, so artifacts without one are an
/// interrupted build and are never loaded.
pub fn build_index(
    config: &Config,
    loader: &dyn DocumentLoader,
    provider: &dyn EmbeddingProvider,
) -> Result<BuildReport> {
    let corpus_dir = &config.corpus.documents_dir;
    let chunk_size = config.chunking.chunk_size;
    let batch_size = config.embedding.batch_size;
    debug_assert!(batch_size > 0, "batch_size must be positive");

    tracing::info!("Indexing corpus at {:?}", corpus_dir);

    let paths = discover_documents(corpus_dir)?;
    tracing::info!("Found {} documents", paths.len());

    let mut all_chunks: Vec<String> = Vec::new();
    let mut documents_indexed = 0;
    let mut documents_skipped = 0;

    for path in &paths {
        let text = match loader.load(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
                documents_skipped += 1;
                continue;
            }
        };

        let before = all_chunks.len();
        all_chunks.extend(segment_words(&text, chunk_size));
        let produced = all_chunks.len() - before;
        if produced == 0 {
            tracing::warn!("Skipping {:?}: no extractable text", path);
            documents_skipped += 1;
            continue;
        }
        tracing::debug!("{:?}: {} chunks", path, produced);
        documents_indexed += 1;
    }

    let mut index = FlatIndex::new(provider.dimension());
    for batch in all_chunks.chunks(batch_size) {
        let embeddings = provider.embed_batch(batch)?;
        index.add(&embeddings)?;
    }

    tracing::info!(
        "Embedded {} chunks from {} documents ({} skipped)",
        all_chunks.len(),
        documents_indexed,
        documents_skipped
    );

    let artifacts_dir = &config.corpus.artifacts_dir;
    std::fs::create_dir_all(artifacts_dir).map_err(|e| LecternError::Io {
        source: e,
        context: format!("Failed to create artifacts directory {:?}", artifacts_dir),
    })?;

    let chunk_count = all_chunks.len();
    index.save(&artifacts_dir.join(INDEX_FILE))?;
    ChunkStore::from_chunks(all_chunks).save(&artifacts_dir.join(CHUNKS_FILE))?;

    let manifest = BuildManifest {
        model: provider.model_name().to_string(),
        dimension: provider.dimension(),
        chunk_size,
        document_count: documents_indexed,
        chunk_count,
        built_at: chrono::Utc::now().to_rfc3339(),
    };
    manifest.save(&artifacts_dir.join(MANIFEST_FILE))?;

    tracing::info!("Index written to {:?}", artifacts_dir);

    Ok(BuildReport {
        documents_indexed,
        documents_skipped,
        chunk_count,
        dimension: provider.dimension(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{FileLoader, IngestError};
    use crate::embedding::EmbeddingError;
    use std::path::PathBuf;

    struct StubProvider;

    impl EmbeddingProvider for StubProvider {
        fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            let words = text.split_whitespace().count() as f32;
            let bytes: u32 = text.bytes().map(u32::from).sum();
            Ok(vec![words, (bytes % 97) as f32, (bytes % 89) as f32, 1.0])
        }

        fn embed_batch(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            texts.iter().map(|t| self.embed(t)).collect()
        }

        fn dimension(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "test-stub"
        }
    }

    struct FlakyLoader;

    impl DocumentLoader for FlakyLoader {
        fn load(&self, path: &std::path::Path) -> std::result::Result<String, IngestError> {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with("bad") {
                Err(IngestError::Read {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                })
            } else {
                FileLoader.load(path)
            }
        }
    }

    fn test_config(corpus: &std::path::Path, artifacts: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.corpus.documents_dir = PathBuf::from(corpus);
        config.corpus.artifacts_dir = PathBuf::from(artifacts);
        config.chunking.chunk_size = 3;
        config.embedding.batch_size = 2;
        config
    }

    #[test]
    fn test_build_creates_aligned_artifacts() {
        let corpus = tempfile::tempdir().unwrap();
        let artifacts = tempfile::tempdir().unwrap();
        std::fs::write(
            corpus.path().join("alpha.txt"),
            "one two three four five six seven",
        )
        .unwrap();
        std::fs::write(corpus.path().join("beta.txt"), "eight nine").unwrap();

        let config = test_config(corpus.path(), artifacts.path());
        let report = build_index(&config, &FileLoader, &StubProvider).unwrap();

        assert_eq!(report.documents_indexed, 2);
        assert_eq!(report.documents_skipped, 0);
        assert_eq!(report.chunk_count, 4);
        assert!(artifacts_exist(artifacts.path()));

        let index = FlatIndex::load(&artifacts.path().join(INDEX_FILE)).unwrap();
        let store = ChunkStore::load(&artifacts.path().join(CHUNKS_FILE)).unwrap();
        let manifest = BuildManifest::load(&artifacts.path().join(MANIFEST_FILE)).unwrap();

        assert_eq!(index.len(), 4);
        assert_eq!(store.len(), 4);
        assert_eq!(manifest.chunk_count, 4);
        assert_eq!(manifest.document_count, 2);
        assert_eq!(manifest.model, "test-stub");
        assert_eq!(manifest.dimension, 4);
        assert_eq!(manifest.chunk_size, 3);

        // Discovery sorts by name, so ids are stable across rebuilds
        assert_eq!(store.get(0), Some("one two three"));
        assert_eq!(store.get(2), Some("seven"));
        assert_eq!(store.get(3), Some("eight nine"));
    }

    #[test]
    fn test_build_skips_unreadable_documents() {
        let corpus = tempfile::tempdir().unwrap();
        let artifacts = tempfile::tempdir().unwrap();
        std::fs::write(corpus.path().join("bad.txt"), "never read").unwrap();
        std::fs::write(corpus.path().join("good.txt"), "hello world").unwrap();

        let config = test_config(corpus.path(), artifacts.path());
        let report = build_index(&config, &FlakyLoader, &StubProvider).unwrap();

        assert_eq!(report.documents_indexed, 1);
        assert_eq!(report.documents_skipped, 1);
        assert_eq!(report.chunk_count, 1);

        let store = ChunkStore::load(&artifacts.path().join(CHUNKS_FILE)).unwrap();
        assert_eq!(store.get(0), Some("hello world"));
    }

    #[test]
    fn test_build_skips_documents_with_no_words() {
        let corpus = tempfile::tempdir().unwrap();
        let artifacts = tempfile::tempdir().unwrap();
        std::fs::write(corpus.path().join("blank.txt"), "  \n\t\n").unwrap();
        std::fs::write(corpus.path().join("real.txt"), "hello world").unwrap();

        let config = test_config(corpus.path(), artifacts.path());
        let report = build_index(&config, &FileLoader, &StubProvider).unwrap();

        assert_eq!(report.documents_indexed, 1);
        assert_eq!(report.documents_skipped, 1);
        assert_eq!(report.chunk_count, 1);

        let manifest = BuildManifest::load(&artifacts.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(manifest.document_count, 1);
        let store = ChunkStore::load(&artifacts.path().join(CHUNKS_FILE)).unwrap();
        assert_eq!(store.get(0), Some("hello world"));
    }

    #[test]
    fn test_build_empty_corpus_is_valid() {
        let corpus = tempfile::tempdir().unwrap();
        let artifacts = tempfile::tempdir().unwrap();

        let config = test_config(corpus.path(), artifacts.path());
        let report = build_index(&config, &FileLoader, &StubProvider).unwrap();

        assert_eq!(report.documents_indexed, 0);
        assert_eq!(report.chunk_count, 0);
        assert!(artifacts_exist(artifacts.path()));

        let index = FlatIndex::load(&artifacts.path().join(INDEX_FILE)).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_rebuild_replaces_artifacts() {
        let corpus = tempfile::tempdir().unwrap();
        let artifacts = tempfile::tempdir().unwrap();
        std::fs::write(corpus.path().join("a.txt"), "a b c d").unwrap();

        let config = test_config(corpus.path(), artifacts.path());
        let first = build_index(&config, &FileLoader, &StubProvider).unwrap();
        assert_eq!(first.chunk_count, 2);

        std::fs::write(corpus.path().join("b.txt"), "e f").unwrap();
        let second = build_index(&config, &FileLoader, &StubProvider).unwrap();
        assert_eq!(second.chunk_count, 3);

        let index = FlatIndex::load(&artifacts.path().join(INDEX_FILE)).unwrap();
        let store = ChunkStore::load(&artifacts.path().join(CHUNKS_FILE)).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);

        let manifest = BuildManifest {
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            chunk_size: 500,
            document_count: 3,
            chunk_count: 42,
            built_at: chrono::Utc::now().to_rfc3339(),
        };
        manifest.save(&path).unwrap();

        let loaded = BuildManifest::load(&path).unwrap();
        assert_eq!(loaded.model, "all-MiniLM-L6-v2");
        assert_eq!(loaded.chunk_count, 42);
        assert_eq!(loaded.dimension, 384);
    }

    #[test]
    fn test_missing_corpus_dir_fails() {
        let artifacts = tempfile::tempdir().unwrap();
        let config = test_config(std::path::Path::new("/nonexistent/corpus"), artifacts.path());

        let result = build_index(&config, &FileLoader, &StubProvider);
        assert!(result.is_err());
    }
}
