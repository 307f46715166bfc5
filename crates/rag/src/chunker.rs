//! Recursive character chunking
//!
//! Splits flattened rule documents into bounded, overlapping chunks. Text is
//! split on the coarsest separator present (paragraphs, then lines, then
//! spaces, then graphemes) and the pieces are merged back up to
//! `chunk_size` characters, carrying roughly `chunk_overlap` characters from
//! the end of one chunk into the start of the next.
//!
//! # Usage
//!
//! ```ignore
//! use pronunciation_rag::chunker::{RecursiveChunker, ChunkConfig};
//!
//! let chunker = RecursiveChunker::new(ChunkConfig::default());
//! let chunks = chunker.chunk_rules(corpus.all());
//! ```

use pronunciation_core::{PronunciationRule, RuleDocumentChunk};
use std::collections::VecDeque;
use unicode_segmentation::UnicodeSegmentation;

/// Chunking configuration. Sizes are in characters.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Tried in order; an empty separator means grapheme-level splitting
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

impl ChunkConfig {
    pub fn from_settings(settings: &pronunciation_config::RagConfig) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            ..Self::default()
        }
    }
}

/// Recursive character splitter
#[derive(Debug, Clone, Default)]
pub struct RecursiveChunker {
    config: ChunkConfig,
}

impl RecursiveChunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Flatten and chunk every rule, assigning ordinals in corpus order
    pub fn chunk_rules(&self, rules: &[PronunciationRule]) -> Vec<RuleDocumentChunk> {
        let mut ordinal = 0;
        let mut chunks = Vec::new();

        for rule in rules {
            for (index, text) in self.split(&rule.flatten()).into_iter().enumerate() {
                chunks.push(RuleDocumentChunk {
                    id: format!("{}#{}", rule.name, index),
                    rule_name: rule.name.clone(),
                    text,
                    ordinal,
                    score: 0.0,
                });
                ordinal += 1;
            }
        }

        chunks
    }

    /// Split a single text into chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.config.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        // Coarsest separator that occurs in the text; the remainder is used
        // for pieces that are still too long.
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep.as_str();
                finer = &separators[i + 1..];
                break;
            }
        }

        let pieces: Vec<&str> = if separator.is_empty() {
            text.graphemes(true).collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut short: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) < self.config.chunk_size {
                short.push(piece);
                continue;
            }

            if !short.is_empty() {
                chunks.extend(self.merge(&short, separator));
                short.clear();
            }

            if finer.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }

        if !short.is_empty() {
            chunks.extend(self.merge(&short, separator));
        }

        chunks
    }

    /// Merge short pieces into chunks of at most `chunk_size` characters
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joiner = |window: &VecDeque<&str>| if window.is_empty() { 0 } else { sep_len };

            if total + len + joiner(&window) > size {
                if !window.is_empty() {
                    push_joined(&mut chunks, &window, separator);

                    // Drop from the front until only the overlap remains and
                    // the next piece fits.
                    while total > overlap
                        || (total > 0 && total + len + joiner(&window) > size)
                    {
                        let dropped = match window.front() {
                            Some(first) => {
                                char_len(first) + if window.len() > 1 { sep_len } else { 0 }
                            }
                            None => break,
                        };
                        total = total.saturating_sub(dropped);
                        window.pop_front();
                    }
                }
            }

            window.push_back(piece);
            total += len + if window.len() > 1 { sep_len } else { 0 };
        }

        push_joined(&mut chunks, &window, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
