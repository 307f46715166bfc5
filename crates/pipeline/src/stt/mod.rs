//! Speech-to-Text
//!
//! Only the HTTP Whisper backend is provided; audio is sent in its uploaded
//! container format without decoding.

mod whisper;

pub use whisper::{WhisperConfig, WhisperStt};
