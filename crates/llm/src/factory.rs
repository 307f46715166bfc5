//! Reasoner factory
//!
//! Creates the configured chat backend and wraps it as a core Reasoner.

use std::sync::Arc;

use pronunciation_config::{ReasoningConfig, ReasoningProvider};
use pronunciation_core::Reasoner;

use crate::{
    adapter::ReasonerAdapter,
    backend::{LlmBackend, LlmConfig, OllamaBackend, OpenAIBackend, OpenAIConfig},
    LlmError,
};

/// Create the backend for the configured provider
pub fn create_backend(settings: &ReasoningConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let backend: Arc<dyn LlmBackend> = match settings.provider {
        ReasoningProvider::OpenAi => {
            Arc::new(OpenAIBackend::new(OpenAIConfig::from_settings(settings))?)
        }
        ReasoningProvider::Ollama => {
            Arc::new(OllamaBackend::new(LlmConfig::from_settings(settings))?)
        }
    };
    Ok(backend)
}

/// Create a Reasoner from settings
pub fn create_reasoner(settings: &ReasoningConfig) -> Result<Arc<dyn Reasoner>, LlmError> {
    let config = LlmConfig::from_settings(settings);

    tracing::info!(
        provider = ?settings.provider,
        model = %config.model,
        endpoint = %config.endpoint,
        timeout_secs = config.timeout.as_secs(),
        max_retries = config.max_retries,
        "Creating reasoning backend"
    );

    let backend = create_backend(settings)?;
    Ok(Arc::new(ReasonerAdapter::from_arc(backend)))
}
