//! Context retrieval
//!
//! The query side of the index: embed a question, fetch the nearest chunks,
//! and decide whether any of them are close enough to answer from. When
//! nothing clears the distance threshold the context is `None` and the
//! caller must refuse to answer rather than guess.

use crate::config::RetrievalConfig;
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::index::{FlatIndex, IndexError, SearchHit, SENTINEL_ID};
use crate::store::ChunkStore;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrieveError {
    #[error("Failed to embed question: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector search failed: {0}")]
    Search(#[from] IndexError),

    #[error("Index references chunk {id} but the store has no such chunk")]
    MissingChunk { id: i64 },
}

/// Result of retrieving context for one question
#[derive(Debug, Clone)]
pub struct Retrieved {
    /// Concatenated context, or `None` when no chunk was close enough
    pub context: Option<String>,
    /// All real candidates in ascending distance order, kept for
    /// diagnostics even when every one missed the threshold
    pub matches: Vec<SearchHit>,
}

/// Retrieves supporting chunks for questions
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    index: FlatIndex,
    store: ChunkStore,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        index: FlatIndex,
        store: ChunkStore,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            provider,
            index,
            store,
            config,
        }
    }

    /// Number of chunks available for retrieval
    pub fn chunk_count(&self) -> usize {
        self.store.len()
    }

    /// Retrieve context for a question
    ///
    /// Fetches the `top_k` nearest chunks, drops sentinel padding, keeps
    /// those within `distance_threshold` (inclusive), and concatenates the
    /// closest `context_chunks` of them with blank lines.
    pub fn retrieve(&self, question: &str) -> Result<Retrieved, RetrieveError> {
        let query = self.provider.embed(question)?;
        let hits = self.index.search(&query, self.config.top_k)?;

        let matches: Vec<SearchHit> = hits.into_iter().filter(|h| h.id != SENTINEL_ID).collect();

        tracing::debug!(
            "Question matched {} candidates: {:?}",
            matches.len(),
            matches
                .iter()
                .map(|h| (h.id, h.distance))
                .collect::<Vec<_>>()
        );

        let mut good = Vec::new();
        for hit in matches
            .iter()
            .filter(|h| h.distance <= self.config.distance_threshold)
            .take(self.config.context_chunks)
        {
            let chunk = self
                .store
                .get(hit.id)
                .ok_or(RetrieveError::MissingChunk { id: hit.id })?;
            good.push(chunk);
        }

        tracing::debug!(
            "{} of {} candidates within threshold {}",
            good.len(),
            matches.len(),
            self.config.distance_threshold
        );

        let context = if good.is_empty() {
            None
        } else {
            Some(good.join("\n\n"))
        };

        Ok(Retrieved { context, matches })
    }
}
