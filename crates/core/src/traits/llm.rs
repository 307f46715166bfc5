//! Reasoning backend trait

use crate::Result;
use async_trait::async_trait;

/// Large-language reasoning service
///
/// The returned text is untrusted: callers must extract and validate any
/// structure they expect from it.
///
/// # Example
///
/// ```ignore
/// let reasoner: Arc<dyn Reasoner> = create_reasoner(&settings.reasoning)?;
/// let raw = reasoner.invoke(&prompt).await?;
/// ```
#[async_trait]
pub trait Reasoner: Send + Sync + 'static {
    /// Send one prompt and return the raw completion text
    async fn invoke(&self, prompt: &str) -> Result<String>;

    /// Whether the backend currently answers; used by readiness checks
    async fn is_available(&self) -> bool {
        true
    }

    /// Model name for logging
    fn model_name(&self) -> &str;
}
