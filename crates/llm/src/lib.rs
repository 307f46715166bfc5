//! Reasoning backend integration
//!
//! Features:
//! - OpenAI-compatible and Ollama chat backends
//! - Configurable request timeout
//! - Retry with exponential backoff on transient failures
//! - Pronunciation analysis prompt composition

pub mod adapter;
pub mod backend;
pub mod factory;
pub mod prompt;

pub use adapter::ReasonerAdapter;
pub use backend::{
    GenerationResult, LlmBackend, LlmConfig, OllamaBackend, OpenAIBackend, OpenAIConfig,
};
pub use factory::{create_backend, create_reasoner};
pub use prompt::{Message, PronunciationPrompt, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Connection failures, timeouts, rate limits and 5xx responses
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout)
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for pronunciation_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => {
                pronunciation_core::Error::Timeout("reasoning backend".to_string())
            }
            other => pronunciation_core::Error::Reasoning(other.to_string()),
        }
    }
}
