//! Text Embeddings
//!
//! Provider selection and the offline hash embedder.

use async_trait::async_trait;
use pronunciation_config::{EmbeddingConfig, EmbeddingProvider};
use pronunciation_core::{Embedder, Result};
use std::sync::Arc;

use crate::{
    OllamaEmbedder, OllamaEmbeddingConfig, OpenAIEmbedder, OpenAIEmbeddingConfig, RagError,
};

/// Build the configured embedder
pub fn create_embedder(config: &EmbeddingConfig) -> std::result::Result<Arc<dyn Embedder>, RagError> {
    let embedder: Arc<dyn Embedder> = match config.provider {
        EmbeddingProvider::OpenAi => {
            Arc::new(OpenAIEmbedder::new(OpenAIEmbeddingConfig::from_settings(config))?)
        }
        EmbeddingProvider::Ollama => {
            Arc::new(OllamaEmbedder::new(OllamaEmbeddingConfig::from_settings(config))?)
        }
        EmbeddingProvider::Hash => Arc::new(SimpleEmbedder::new(config.dim)),
    };

    tracing::info!(
        provider = ?config.provider,
        model = embedder.model_name(),
        dim = embedder.dim(),
        "Embedder initialized"
    );

    Ok(embedder)
}

/// Deterministic hash embedder (no model, no network)
///
/// Counts hashed character unigrams and bigrams, ignoring whitespace, then
/// L2-normalizes. Texts sharing Hangul syllables score higher under cosine.
#[derive(Debug, Clone)]
pub struct SimpleEmbedder {
    dim: usize,
}

impl SimpleEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dim];
        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();

        for c in &chars {
            let mut buf = [0u8; 4];
            embedding[self.bucket(c.encode_utf8(&mut buf).as_bytes())] += 1.0;
        }

        for pair in chars.windows(2) {
            let bigram: String = pair.iter().collect();
            embedding[self.bucket(bigram.as_bytes())] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }

    fn bucket(&self, bytes: &[u8]) -> usize {
        // FNV-1a
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for b in bytes {
            hash ^= u64::from(*b);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        (hash % self.dim as u64) as usize
    }
}

#[async_trait]
impl Embedder for SimpleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        "hash"
    }
}
