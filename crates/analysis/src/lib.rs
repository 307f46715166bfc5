//! Pronunciation analysis
//!
//! Pattern tables and matcher, the reasoning output parser, the pure
//! decision-priority function and the engine that ties them together.

pub mod decision;
pub mod engine;
pub mod matcher;
pub mod metric_names;
pub mod parser;
pub mod patterns;

pub use decision::{override_feedback, override_result, resolve, Decision, DecisionSource};
pub use engine::{AnalysisConfig, AnalysisContext, DecisionEngine};
pub use matcher::match_patterns;
pub use parser::{extract_json, OutputParser, ParseError};
pub use patterns::{PatternSource, PatternTables};

use thiserror::Error;

/// Analysis failure; the variant names the stage that failed
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("transcription is empty")]
    EmptyTranscription,

    #[error("rule retrieval failed: {0}")]
    Retrieval(#[source] pronunciation_core::Error),

    #[error("reasoning backend failed: {0}")]
    Reasoning(#[source] pronunciation_core::Error),

    #[error("output schema failed to compile: {0}")]
    Schema(String),
}

impl AnalysisError {
    /// Failed because an external provider failed
    pub fn is_upstream(&self) -> bool {
        match self {
            AnalysisError::Retrieval(e) | AnalysisError::Reasoning(e) => e.is_upstream(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_classification() {
        let err = AnalysisError::Reasoning(pronunciation_core::Error::Timeout("llm".into()));
        assert!(err.is_upstream());
        assert!(err.to_string().contains("reasoning backend failed"));

        let err = AnalysisError::Retrieval(pronunciation_core::Error::Retrieval("index".into()));
        assert!(!err.is_upstream());
        assert!(!AnalysisError::EmptyTranscription.is_upstream());
    }
}
