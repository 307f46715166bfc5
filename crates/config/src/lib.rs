//! Configuration management for the pronunciation analysis service
//!
//! Supports loading configuration from:
//! - YAML/TOML/JSON files under `config/`
//! - Environment variables (PRONUNCIATION_ prefix, `__` separator)
//! - Conventional variables (`PORT`, `OPENAI_API_KEY`, `AI_MODEL`, `DATA_DIR`, ...)
//!   used as defaults when nothing more specific is set

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, DataConfig, DistanceMetric, EmbeddingConfig, EmbeddingProvider, ObservabilityConfig,
    RagConfig, ReasoningConfig, ReasoningProvider, RuntimeEnvironment, ServerConfig, Settings,
    TranscriptionConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
