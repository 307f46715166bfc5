//! Audio front end
//!
//! Turns an uploaded clip into a [`Transcript`](pronunciation_core::Transcript)
//! through an OpenAI-compatible transcription endpoint.

pub mod stt;

pub use stt::{WhisperConfig, WhisperStt};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Transcription request failed: {0}")]
    Request(String),

    #[error("Transcription API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid transcription response: {0}")]
    InvalidResponse(String),

    #[error("Transcription timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PipelineError::Timeout
        } else {
            PipelineError::Request(err.to_string())
        }
    }
}

impl From<PipelineError> for pronunciation_core::Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Timeout => {
                pronunciation_core::Error::Timeout("transcription service".to_string())
            }
            PipelineError::Configuration(msg) => pronunciation_core::Error::Config(msg),
            other => pronunciation_core::Error::Transcription(other.to_string()),
        }
    }
}
