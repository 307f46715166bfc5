//! Speech-to-text trait

use crate::{AudioClip, Result, Transcript};
use async_trait::async_trait;

/// Speech-to-Text interface
///
/// Implementations:
/// - `WhisperStt` - OpenAI-compatible `/audio/transcriptions`
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn SpeechToText> = Arc::new(WhisperStt::new(config)?);
/// let transcript = stt.transcribe(&clip).await?;
/// tracing::info!(text = %transcript.text, "Transcribed");
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe one uploaded clip
    async fn transcribe(&self, audio: &AudioClip) -> Result<Transcript>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}
