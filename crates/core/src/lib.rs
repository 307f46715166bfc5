//! Core traits and types for Korean pronunciation analysis
//!
//! This crate provides foundational types used across all other crates:
//! - Rule corpus and pattern-table types
//! - Analysis request/result types
//! - Audio upload and transcript types
//! - Capability traits for pluggable backends (embedding, reasoning, retrieval, STT)
//! - Error types

pub mod audio;
pub mod error;
pub mod pronunciation;
pub mod traits;
pub mod transcript;

pub use audio::{AudioClip, AudioFormat};
pub use error::{Error, Result};
pub use pronunciation::{
    AnalysisRequest, AnalysisResult, PatternEntry, PatternMatch, PatternType, PronunciationRule,
    RuleDocumentChunk, RuleExample, Verdict,
};
pub use transcript::{Transcript, WordTiming};

pub use traits::{Embedder, Reasoner, Retriever, SpeechToText};
