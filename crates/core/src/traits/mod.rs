//! Capability traits for pluggable backends
//!
//! The analysis engine depends only on these traits, so every external
//! collaborator can be replaced by a deterministic fake in tests.
//!
//! ```text
//! Embedding:      Embedder      text → fixed-dimension vector
//! Reasoning:      Reasoner      prompt → raw completion text
//! Retrieval:      Retriever     query → top-k rule chunks
//! Speech:         SpeechToText  audio clip → transcript
//! ```

mod embedding;
mod llm;
mod retriever;
mod speech;

pub use embedding::Embedder;
pub use llm::Reasoner;
pub use retriever::Retriever;
pub use speech::SpeechToText;
