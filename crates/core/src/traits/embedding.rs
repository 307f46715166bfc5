//! Embedding trait

use crate::Result;
use async_trait::async_trait;

/// Text embedding interface
///
/// Implementations:
/// - `OpenAIEmbedder` - `/embeddings` on any OpenAI-compatible endpoint
/// - `OllamaEmbedder` - local Ollama `/api/embed`
/// - `SimpleEmbedder` - deterministic hash embedding for offline use and tests
#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Vector dimension
    fn dim(&self) -> usize;

    /// Model name for logging
    fn model_name(&self) -> &str;
}
