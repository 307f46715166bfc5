//! OpenAI-compatible Embeddings
//!
//! Calls `POST {endpoint}/embeddings` with batched input.

use async_trait::async_trait;
use pronunciation_core::{Embedder, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::RagError;

/// Inputs per request
const MAX_BATCH: usize = 96;

/// OpenAI embedding configuration
#[derive(Debug, Clone)]
pub struct OpenAIEmbeddingConfig {
    /// API base, e.g. `https://api.openai.com/v1`
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub embedding_dim: usize,
    pub timeout: Duration,
}

impl Default for OpenAIEmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: pronunciation_config::constants::endpoints::OPENAI_DEFAULT.to_string(),
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            embedding_dim: 1536,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenAIEmbeddingConfig {
    pub fn from_settings(settings: &pronunciation_config::EmbeddingConfig) -> Self {
        Self {
            endpoint: settings.resolved_endpoint(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            embedding_dim: settings.dim,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// OpenAI embedder
pub struct OpenAIEmbedder {
    client: Client,
    config: OpenAIEmbeddingConfig,
}

impl OpenAIEmbedder {
    pub fn new(config: OpenAIEmbeddingConfig) -> std::result::Result<Self, RagError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.endpoint.trim_end_matches('/'))
    }

    async fn request(&self, input: &[String]) -> std::result::Result<Vec<Vec<f32>>, RagError> {
        let body = EmbeddingRequest {
            model: &self.config.model,
            input,
        };

        let mut request = self.client.post(self.embeddings_url()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "Embedding API error: {} - {}",
                status, text
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to parse embedding response: {}", e)))?;

        if parsed.data.len() != input.len() {
            return Err(RagError::Embedding(format!(
                "Expected {} embeddings, got {}",
                input.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("No embedding returned".to_string()).into())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            out.extend(self.request(batch).await?);
        }
        Ok(out)
    }

    fn dim(&self) -> usize {
        self.config.embedding_dim
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
