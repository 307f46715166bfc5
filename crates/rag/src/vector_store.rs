//! In-memory vector store
//!
//! Exact nearest-neighbour search over the embedded rule chunks. The store
//! is filled once while the index is built and only read afterwards, so
//! concurrent searches need no locking.

use pronunciation_config::DistanceMetric;
use pronunciation_core::RuleDocumentChunk;
use std::cmp::Ordering;

use crate::RagError;

/// Similarity metric; higher scores are always more similar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VectorDistance {
    #[default]
    Cosine,
    /// Scored as negative L2 distance
    Euclidean,
    DotProduct,
}

impl From<DistanceMetric> for VectorDistance {
    fn from(metric: DistanceMetric) -> Self {
        match metric {
            DistanceMetric::Cosine => VectorDistance::Cosine,
            DistanceMetric::Euclidean => VectorDistance::Euclidean,
            DistanceMetric::DotProduct => VectorDistance::DotProduct,
        }
    }
}

impl VectorDistance {
    /// Similarity score, or `None` when undefined (zero vector, length mismatch)
    pub fn score(&self, a: &[f32], b: &[f32]) -> Option<f32> {
        if a.len() != b.len() || a.is_empty() {
            return None;
        }

        let score = match self {
            VectorDistance::Cosine => {
                let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
                for (x, y) in a.iter().zip(b) {
                    let (x, y) = (f64::from(*x), f64::from(*y));
                    dot += x * y;
                    na += x * x;
                    nb += y * y;
                }
                if na == 0.0 || nb == 0.0 {
                    return None;
                }
                (dot / (na.sqrt() * nb.sqrt())) as f32
            }
            VectorDistance::Euclidean => {
                let sum: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                -sum.sqrt()
            }
            VectorDistance::DotProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        };

        score.is_finite().then_some(score)
    }
}

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: RuleDocumentChunk,
    vector: Vec<f32>,
}

/// Vector store over rule chunks
#[derive(Debug, Clone)]
pub struct VectorStore {
    entries: Vec<IndexedChunk>,
    dim: usize,
    distance: VectorDistance,
}

impl VectorStore {
    pub fn new(dim: usize, distance: VectorDistance) -> Self {
        Self {
            entries: Vec::new(),
            dim,
            distance,
        }
    }

    /// Add a chunk with its embedding
    pub fn insert(&mut self, chunk: RuleDocumentChunk, vector: Vec<f32>) -> Result<(), RagError> {
        if vector.len() != self.dim {
            return Err(RagError::Index(format!(
                "Chunk {} has dimension {}, expected {}",
                chunk.id,
                vector.len(),
                self.dim
            )));
        }

        self.entries.push(IndexedChunk { chunk, vector });
        Ok(())
    }

    /// Return up to `k` chunks ordered by score, ties broken by corpus ordinal
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RuleDocumentChunk>, RagError> {
        if query.len() != self.dim {
            return Err(RagError::Search(format!(
                "Query has dimension {}, expected {}",
                query.len(),
                self.dim
            )));
        }

        let mut hits: Vec<(f32, &IndexedChunk)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                self.distance
                    .score(query, &entry.vector)
                    .map(|score| (score, entry))
            })
            .collect();

        hits.sort_by(|(sa, a), (sb, b)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.ordinal.cmp(&b.chunk.ordinal))
        });
        hits.truncate(k);

        Ok(hits
            .into_iter()
            .map(|(score, entry)| RuleDocumentChunk {
                score,
                ..entry.chunk.clone()
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}
