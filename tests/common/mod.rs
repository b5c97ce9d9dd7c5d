//! Shared test fixtures: a deterministic embedding provider and scripted
//! generation backends.
#![allow(dead_code)]

use lectern::embedding::{EmbeddingError, EmbeddingProvider};
use lectern::generation::{GenerateError, GenerationBackend, GenerationReply};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Deterministic word-overlap embedder
///
/// Hashes each word into a bucket and L2-normalizes the bucket counts.
/// Texts sharing words land close together and texts sharing none sit near
/// squared distance 2.0, so threshold filtering behaves like it does with
/// a real sentence embedder, without downloading one.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text.to_lowercase().split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric());
            if word.is_empty() {
                continue;
            }

            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in word.bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % self.dimension as u64) as usize] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hash-test"
    }
}

/// Backend that always returns the same reply
pub struct ScriptedBackend {
    pub reply: GenerationReply,
}

impl GenerationBackend for ScriptedBackend {
    fn generate(&self, _prompt: &str) -> Result<GenerationReply, GenerateError> {
        Ok(self.reply.clone())
    }
}

/// Backend that echoes the whole prompt back as the answer
///
/// Lets tests check that the retrieved context actually reached the
/// generation side.
pub struct EchoBackend;

impl GenerationBackend for EchoBackend {
    fn generate(&self, prompt: &str) -> Result<GenerationReply, GenerateError> {
        Ok(GenerationReply::Completed(prompt.to_string()))
    }
}

/// Backend that counts invocations
///
/// The counter is shared, so tests can keep a handle after the backend
/// moves into an engine.
pub struct CountingBackend {
    calls: Arc<AtomicUsize>,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl GenerationBackend for CountingBackend {
    fn generate(&self, _prompt: &str) -> Result<GenerationReply, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GenerationReply::Completed(
            "must never reach the caller".to_string(),
        ))
    }
}
