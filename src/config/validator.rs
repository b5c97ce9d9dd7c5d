//! Configuration validation

use super::Config;
use crate::error::{Result, ValidationError};

/// Validates configuration values
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the entire configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_meta(config, &mut errors);
        Self::validate_chunking(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_generation(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(crate::error::LecternError::ConfigValidation { errors })
        }
    }

    fn validate_meta(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.meta.schema_version.is_empty() {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                "Schema version cannot be empty",
            ));
        } else if !config.meta.schema_version.starts_with("1.") {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!(
                    "Unsupported schema version: {} (expected 1.x)",
                    config.meta.schema_version
                ),
            ));
        }
    }

    fn validate_chunking(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.chunking.chunk_size == 0 {
            errors.push(ValidationError::new(
                "chunking.chunk_size",
                "Chunk size must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        let valid_models = ["all-MiniLM-L6-v2", "bge-small-en-v1.5", "bge-base-en-v1.5"];
        if !valid_models.contains(&config.embedding.model.as_str()) {
            errors.push(ValidationError::new(
                "embedding.model",
                format!(
                    "Invalid model: {} (valid: {})",
                    config.embedding.model,
                    valid_models.join(", ")
                ),
            ));
        }

        if config.embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "Top-k must be greater than 0",
            ));
        }

        if !config.retrieval.distance_threshold.is_finite()
            || config.retrieval.distance_threshold < 0.0
        {
            errors.push(ValidationError::new(
                "retrieval.distance_threshold",
                "Distance threshold must be a finite value >= 0",
            ));
        }

        if config.retrieval.context_chunks == 0 {
            errors.push(ValidationError::new(
                "retrieval.context_chunks",
                "Context chunks must be greater than 0",
            ));
        }
    }

    fn validate_generation(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.generation.command.is_empty() {
            errors.push(ValidationError::new(
                "generation.command",
                "Generation command cannot be empty",
            ));
        }

        if config.generation.model.is_empty() {
            errors.push(ValidationError::new(
                "generation.model",
                "Generation model cannot be empty",
            ));
        }

        if config.generation.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "generation.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }
}
