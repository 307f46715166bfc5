//! Retrieval trait

use crate::{Result, RuleDocumentChunk};
use async_trait::async_trait;

/// Rule-document retriever
#[async_trait]
pub trait Retriever: Send + Sync + 'static {
    /// Return at most `top_k` chunks, most relevant first. Equal scores keep
    /// corpus order.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RuleDocumentChunk>>;

    /// Number of indexed chunks
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retriever name for logging
    fn name(&self) -> &str;
}
