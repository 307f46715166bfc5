//! Error types shared across crates

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Corpus format error: {0}")]
    CorpusFormat(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Reasoning backend error: {0}")]
    Reasoning(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error originated in an external provider (embedding,
    /// reasoning or transcription service) rather than in local logic.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Embedding(_)
                | Error::Reasoning(_)
                | Error::Transcription(_)
                | Error::Timeout(_)
        )
    }
}
