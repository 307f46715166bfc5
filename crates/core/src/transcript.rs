//! Transcription output types

use serde::{Deserialize, Serialize};

/// Result of transcribing one uploaded utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// Language reported by the provider
    #[serde(default)]
    pub language: Option<String>,
    /// Duration of the audio in seconds
    #[serde(default)]
    pub duration_secs: Option<f32>,
    #[serde(default)]
    pub words: Vec<WordTiming>,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Word-level timing, in seconds from the start of the clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start: f32,
    pub end: f32,
}
