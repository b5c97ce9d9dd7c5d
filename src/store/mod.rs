//! Chunk store
//!
//! Owns the chunk texts the vector index points at. Position is identity:
//! the i-th vector in the index embeds the i-th chunk here, so the two
//! artifacts are only meaningful as a pair and are rebuilt together.

use crate::error::{LecternError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered collection of chunk texts, addressed by chunk id
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChunkStore {
    chunks: Vec<String>,
}

impl ChunkStore {
    pub fn from_chunks(chunks: Vec<String>) -> Self {
        Self { chunks }
    }

    /// Look up a chunk by id
    ///
    /// Negative ids (sentinels) and out-of-range ids return `None`.
    pub fn get(&self, id: i64) -> Option<&str> {
        if id < 0 {
            return None;
        }
        self.chunks.get(id as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Save the store as JSON (atomic: temp file + rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| LecternError::Json {
            source: e,
            context: "Failed to serialize chunk store".to_string(),
        })?;

        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, json).map_err(|e| LecternError::Io {
            source: e,
            context: format!("Failed to write chunk store to {:?}", temp_path),
        })?;
        std::fs::rename(&temp_path, path).map_err(|e| LecternError::Io {
            source: e,
            context: format!("Failed to move chunk store into place at {:?}", path),
        })?;

        Ok(())
    }

    /// Load a store from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LecternError::Io {
            source: e,
            context: format!("Failed to read chunk store from {:?}", path),
        })?;

        serde_json::from_str(&content).map_err(|e| LecternError::Json {
            source: e,
            context: format!("Failed to parse chunk store at {:?}", path),
        })
    }
}
