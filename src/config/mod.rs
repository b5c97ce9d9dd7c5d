//! Configuration management for lectern
//!
//! Loads, validates, and persists the TOML configuration that ties the two
//! pipelines together. Retrieval tuning (`top_k`, `distance_threshold`) is
//! deliberately configuration rather than code: the shipped defaults are
//! calibrated for the default embedding model and must be re-tuned whenever
//! the model changes.

use crate::error::{LecternError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub corpus: CorpusConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Corpus and artifact locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory scanned for source documents
    pub documents_dir: PathBuf,
    /// Directory holding the built index artifacts
    pub artifacts_dir: PathBuf,
}

/// Document segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Words per chunk; fixed for the lifetime of one index build
    pub chunk_size: usize,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2")
    pub model: String,
    /// Batch size for index-time embedding
    pub batch_size: usize,
}

/// Retrieval configuration
///
/// `distance_threshold` is an absolute cutoff on squared L2 distance and is
/// tuned together with `top_k` for one embedding model; swapping the model
/// invalidates both values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Nearest candidates fetched per question before filtering
    pub top_k: usize,
    /// Maximum acceptable squared L2 distance (lower = stricter)
    pub distance_threshold: f32,
    /// Maximum chunks concatenated into the prompt context
    pub context_chunks: usize,
}

/// Answer generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Generation program, invoked as `<command> run <model>` with the
    /// prompt on stdin
    pub command: String,
    /// Model argument passed to the program
    pub model: String,
    /// Seconds to wait for the generation process before giving up
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LecternError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| LecternError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| LecternError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: LECTERN_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("LECTERN_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "CORPUS__DOCUMENTS_DIR" => {
                self.corpus.documents_dir = PathBuf::from(value);
            }
            "CORPUS__ARTIFACTS_DIR" => {
                self.corpus.artifacts_dir = PathBuf::from(value);
            }
            "CHUNKING__CHUNK_SIZE" => {
                self.chunking.chunk_size = parse_env(path, value)?;
            }
            "EMBEDDING__MODEL" => {
                self.embedding.model = value.to_string();
            }
            "EMBEDDING__BATCH_SIZE" => {
                self.embedding.batch_size = parse_env(path, value)?;
            }
            "RETRIEVAL__TOP_K" => {
                self.retrieval.top_k = parse_env(path, value)?;
            }
            "RETRIEVAL__DISTANCE_THRESHOLD" => {
                self.retrieval.distance_threshold = parse_env(path, value)?;
            }
            "RETRIEVAL__CONTEXT_CHUNKS" => {
                self.retrieval.context_chunks = parse_env(path, value)?;
            }
            "GENERATION__COMMAND" => {
                self.generation.command = value.to_string();
            }
            "GENERATION__MODEL" => {
                self.generation.model = value.to_string();
            }
            "GENERATION__TIMEOUT_SECS" => {
                self.generation.timeout_secs = parse_env(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| LecternError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("lectern").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = PathBuf::from("~/.lectern");

        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            corpus: CorpusConfig {
                documents_dir: data_dir.join("corpus"),
                artifacts_dir: data_dir.join("index"),
            },
            chunking: ChunkingConfig { chunk_size: 500 },
            embedding: EmbeddingConfig {
                model: "all-MiniLM-L6-v2".to_string(),
                batch_size: 32,
            },
            retrieval: RetrievalConfig {
                top_k: 5,
                distance_threshold: 1.3,
                context_chunks: 3,
            },
            generation: GenerationConfig {
                command: "ollama".to_string(),
                model: "orca-mini:3b".to_string(),
                timeout_secs: 120,
            },
        }
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| LecternError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}
