//! Question-answering engine
//!
//! Composes a retriever and an answer generator over one set of loaded
//! artifacts. Everything is loaded once and then shared read-only, so
//! `ask` takes `&self` and concurrent questions need no coordination.

use crate::config::Config;
use crate::embedding::{EmbeddingProvider, FastEmbedProvider};
use crate::error::{LecternError, Result};
use crate::generation::{AnswerGenerator, GenerationBackend, ProcessBackend};
use crate::index::{FlatIndex, SearchHit};
use crate::indexer::{self, BuildManifest};
use crate::retrieval::Retriever;
use crate::store::ChunkStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Load index artifacts and wire them to an embedding provider
///
/// Refuses artifacts that do not form a matched set: the index, store and
/// manifest must agree on the chunk count, and the manifest's model must be
/// the one the provider runs. A mismatch means retrieval would be silently
/// wrong, so it is an error, not a warning.
pub fn load_retriever(config: &Config, provider: Arc<dyn EmbeddingProvider>) -> Result<Retriever> {
    let dir = &config.corpus.artifacts_dir;
    if !indexer::artifacts_exist(dir) {
        return Err(LecternError::ArtifactsNotFound { dir: dir.clone() });
    }

    let manifest = BuildManifest::load(&dir.join(indexer::MANIFEST_FILE))?;
    let index = FlatIndex::load(&dir.join(indexer::INDEX_FILE))?;
    let store = ChunkStore::load(&dir.join(indexer::CHUNKS_FILE))?;

    if index.len() != store.len() || index.len() != manifest.chunk_count {
        return Err(LecternError::ArtifactMismatch {
            message: format!(
                "index has {} vectors, store has {} chunks, manifest says {}",
                index.len(),
                store.len(),
                manifest.chunk_count
            ),
        });
    }

    if manifest.model != provider.model_name() {
        return Err(LecternError::ArtifactMismatch {
            message: format!(
                "artifacts were built with model '{}' but '{}' is configured",
                manifest.model,
                provider.model_name()
            ),
        });
    }

    if manifest.dimension != provider.dimension() || index.dimension() != provider.dimension() {
        return Err(LecternError::ArtifactMismatch {
            message: format!(
                "artifacts are {}-dimensional but the model produces {} dimensions",
                index.dimension(),
                provider.dimension()
            ),
        });
    }

    tracing::info!(
        "Loaded {} chunks (model {}, built {})",
        manifest.chunk_count,
        manifest.model,
        manifest.built_at
    );

    Ok(Retriever::new(provider, index, store, config.retrieval.clone()))
}

/// Result of answering one question
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    /// Final answer text (generated, or one of the fixed fallbacks)
    pub answer: String,
    /// Distance/id pairs of the retrieval candidates, closest first
    pub matches: Vec<SearchHit>,
}

/// The full query pipeline: question in, answer out
pub struct QaEngine<B: GenerationBackend> {
    retriever: Retriever,
    generator: AnswerGenerator<B>,
}

impl QaEngine<ProcessBackend> {
    /// Open the engine from configuration
    ///
    /// Initializes the configured embedding model, loads the artifacts,
    /// and sets up the generation command (`<command> run <model>`).
    pub fn open(config: &Config) -> Result<Self> {
        let provider = Arc::new(FastEmbedProvider::new(&config.embedding.model)?);
        let retriever = load_retriever(config, provider)?;

        let backend = ProcessBackend::new(
            config.generation.command.clone(),
            vec!["run".to_string(), config.generation.model.clone()],
            Duration::from_secs(config.generation.timeout_secs),
        );

        Ok(Self::new(retriever, AnswerGenerator::new(backend)))
    }
}

impl<B: GenerationBackend> QaEngine<B> {
    pub fn new(retriever: Retriever, generator: AnswerGenerator<B>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    /// Number of chunks available to answer from
    pub fn chunk_count(&self) -> usize {
        self.retriever.chunk_count()
    }

    /// Answer one question strictly from the indexed corpus
    pub fn ask(&self, question: &str) -> Result<AskOutcome> {
        let retrieved = self.retriever.retrieve(question)?;
        let answer = self
            .generator
            .answer(question, retrieved.context.as_deref())?;

        Ok(AskOutcome {
            answer,
            matches: retrieved.matches,
        })
    }
}
