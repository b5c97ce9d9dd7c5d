use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the lectern application
#[derive(Error, Debug)]
pub enum LecternError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Index artifacts missing or unreadable
    #[error("Index artifacts not found in {}: run `lectern index` first", dir.display())]
    ArtifactsNotFound { dir: PathBuf },

    /// Vector index, chunk store and manifest disagree about what was built
    #[error("Index artifacts are misaligned: {message}: rebuild with `lectern index`")]
    ArtifactMismatch { message: String },

    /// Document loading errors
    #[error(transparent)]
    Ingest(#[from] crate::corpus::IngestError),

    /// Embedding generation errors
    #[error(transparent)]
    Embedding(#[from] crate::embedding::EmbeddingError),

    /// Vector index errors
    #[error(transparent)]
    Index(#[from] crate::index::IndexError),

    /// Retrieval errors
    #[error(transparent)]
    Retrieve(#[from] crate::retrieval::RetrieveError),

    /// Answer generation errors
    #[error(transparent)]
    Generate(#[from] crate::generation::GenerateError),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for lectern operations
pub type Result<T> = std::result::Result<T, LecternError>;
