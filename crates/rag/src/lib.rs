//! Rule corpus retrieval
//!
//! Features:
//! - Rule corpus loading from JSON/YAML
//! - Recursive character chunking with overlap
//! - Embedding providers (OpenAI-compatible, Ollama, offline hash)
//! - Immutable in-memory vector index with deterministic tie-breaking
//! - Core Retriever trait implementation

pub mod chunker;
pub mod embeddings;
pub mod knowledge_loader;
pub mod ollama_embeddings;
pub mod openai_embeddings;
pub mod retriever;
pub mod vector_store;

pub use chunker::{ChunkConfig, RecursiveChunker};
pub use embeddings::{create_embedder, SimpleEmbedder};
pub use knowledge_loader::RuleCorpus;
pub use ollama_embeddings::{OllamaEmbedder, OllamaEmbeddingConfig};
pub use openai_embeddings::{OpenAIEmbedder, OpenAIEmbeddingConfig};
pub use retriever::RuleRetriever;
pub use vector_store::{VectorDistance, VectorStore};

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    /// Rule corpus document has the wrong top-level shape
    #[error("Corpus format error: {0}")]
    CorpusFormat(String),

    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Search error: {0}")]
    Search(String),
}

impl From<RagError> for pronunciation_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::CorpusFormat(msg) => pronunciation_core::Error::CorpusFormat(msg),
            RagError::Embedding(msg) => pronunciation_core::Error::Embedding(msg),
            other => pronunciation_core::Error::Retrieval(other.to_string()),
        }
    }
}
