//! Flat vector index
//!
//! Exact nearest-neighbor search over squared L2 distance. Vectors are
//! stored row-major in one contiguous buffer and every query scans all of
//! them, which is the right trade at corpus scale: a few thousand chunks
//! scan in well under a millisecond and results are exact, so the distance
//! threshold in retrieval stays meaningful.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use thiserror::Error;

/// Id returned for padding positions when the index holds fewer than `k`
/// vectors. Never a valid chunk id.
pub const SENTINEL_ID: i64 = -1;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    #[error("Index serialization failed: {0}")]
    Serialization(#[from] bincode::Error),
}

/// One nearest-neighbor result
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit {
    /// Position of the vector at insertion time, or [`SENTINEL_ID`]
    pub id: i64,
    /// Squared L2 distance to the query (`f32::INFINITY` for sentinels)
    pub distance: f32,
}

/// Exact-scan vector index over squared L2 distance
#[derive(Debug, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Number of vectors stored
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Append vectors; ids continue from the current length
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Find the `k` nearest vectors to `query`, closest first
    ///
    /// Always returns exactly `k` hits; when fewer than `k` vectors are
    /// stored the tail is padded with sentinel hits. Ties keep insertion
    /// order (stable sort), so results are deterministic.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = (0..self.len())
            .map(|row| {
                let start = row * self.dimension;
                let vector = &self.data[start..start + self.dimension];
                SearchHit {
                    id: row as i64,
                    distance: squared_l2(query, vector),
                }
            })
            .collect();

        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        hits.truncate(k);

        while hits.len() < k {
            hits.push(SearchHit {
                id: SENTINEL_ID,
                distance: f32::INFINITY,
            });
        }

        Ok(hits)
    }

    /// Save the index to a binary file (atomic: temp file + rename)
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let encoded = bincode::serialize(self)?;

        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, &encoded).map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to write index to {:?}", temp_path),
        })?;
        std::fs::rename(&temp_path, path).map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to move index into place at {:?}", path),
        })?;

        Ok(())
    }

    /// Load an index from a binary file
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let bytes = std::fs::read(path).map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to read index from {:?}", path),
        })?;

        Ok(bincode::deserialize(&bytes)?)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> FlatIndex {
        let mut index = FlatIndex::new(2);
        index
            .add(&[vec![0.0, 0.0], vec![3.0, 4.0], vec![1.0, 0.0]])
            .unwrap();
        index
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = sample_index();
        let hits = index.search(&[0.0, 0.0], 3).unwrap();

        assert_eq!(hits[0].id, 0);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[1].id, 2);
        assert_eq!(hits[1].distance, 1.0);
        assert_eq!(hits[2].id, 1);
        assert_eq!(hits[2].distance, 25.0);
    }

    #[test]
    fn test_search_truncates_to_k() {
        let index = sample_index();
        let hits = index.search(&[0.0, 0.0], 2).unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 0);
        assert_eq!(hits[1].id, 2);
    }

    #[test]
    fn test_search_pads_with_sentinels() {
        let index = sample_index();
        let hits = index.search(&[0.0, 0.0], 5).unwrap();

        assert_eq!(hits.len(), 5);
        assert_eq!(hits[3].id, SENTINEL_ID);
        assert_eq!(hits[3].distance, f32::INFINITY);
        assert_eq!(hits[4].id, SENTINEL_ID);
    }

    #[test]
    fn test_empty_index_all_sentinels() {
        let index = FlatIndex::new(4);
        let hits = index.search(&[0.0; 4], 3).unwrap();

        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.id == SENTINEL_ID));
    }

    #[test]
    fn test_k_zero_empty() {
        let index = sample_index();
        let hits = index.search(&[0.0, 0.0], 0).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = FlatIndex::new(2);
        index
            .add(&[vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]])
            .unwrap();

        let hits = index.search(&[1.0, 1.0], 3).unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_add_rejects_wrong_dimension() {
        let mut index = FlatIndex::new(3);
        let result = index.add(&[vec![1.0, 2.0]]);
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(index.is_empty());
    }

    #[test]
    fn test_search_rejects_wrong_dimension() {
        let index = sample_index();
        let result = index.search(&[0.0, 0.0, 0.0], 1);
        assert!(matches!(result, Err(IndexError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.bin");

        let index = sample_index();
        index.save(&path).unwrap();

        let loaded = FlatIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.dimension(), 2);

        let hits = loaded.search(&[3.0, 4.0], 1).unwrap();
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn test_load_missing_file() {
        let result = FlatIndex::load(Path::new("/nonexistent/vectors.bin"));
        assert!(matches!(result, Err(IndexError::Io { .. })));
    }
}
