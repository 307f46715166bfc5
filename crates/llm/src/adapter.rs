//! Reasoner adapter
//!
//! Bridges the LlmBackend trait to the core Reasoner trait, so any chat
//! backend can be used where a single-shot prompt-to-text call is expected.

use async_trait::async_trait;
use std::sync::Arc;

use pronunciation_core::{Reasoner, Result};

use crate::backend::LlmBackend;
use crate::prompt::Message;

/// Adapter that wraps an LlmBackend to implement the core Reasoner trait
pub struct ReasonerAdapter {
    backend: Arc<dyn LlmBackend>,
    model_name: String,
}

impl ReasonerAdapter {
    pub fn new<B: LlmBackend + 'static>(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    pub fn from_arc(backend: Arc<dyn LlmBackend>) -> Self {
        let model_name = backend.model_name().to_string();
        Self {
            backend,
            model_name,
        }
    }
}

#[async_trait]
impl Reasoner for ReasonerAdapter {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let messages = [Message::user(prompt)];
        let result = self.backend.generate(&messages).await?;

        tracing::debug!(
            model = %self.model_name,
            tokens = result.tokens,
            attempts = result.attempts,
            elapsed_ms = result.total_time_ms,
            "Reasoning completed"
        );

        Ok(result.text)
    }

    async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GenerationResult;
    use crate::prompt::Role;
    use crate::LlmError;
    use std::sync::Mutex;

    struct RecordingBackend {
        seen: Mutex<Vec<Message>>,
        reply: std::result::Result<String, fn() -> LlmError>,
    }

    #[async_trait]
    impl LlmBackend for RecordingBackend {
        async fn generate(
            &self,
            messages: &[Message],
        ) -> std::result::Result<GenerationResult, LlmError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.extend(messages.iter().cloned());
            }
            match &self.reply {
                Ok(text) => Ok(GenerationResult {
                    text: text.clone(),
                    tokens: 3,
                    total_time_ms: 1,
                    attempts: 1,
                }),
                Err(make) => Err(make()),
            }
        }

        async fn is_available(&self) -> bool {
            self.reply.is_ok()
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_invoke_sends_single_user_message() {
        let backend = Arc::new(RecordingBackend {
            seen: Mutex::new(Vec::new()),
            reply: Ok(r#"{"result":"Correct pronunciation"}"#.to_string()),
        });
        let adapter = ReasonerAdapter::from_arc(backend.clone());

        let text = adapter.invoke("prompt body").await.unwrap();
        assert!(text.contains("Correct pronunciation"));
        assert_eq!(adapter.model_name(), "recording");
        assert!(adapter.is_available().await);

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].role, Role::User);
        assert_eq!(seen[0].content, "prompt body");
    }

    #[tokio::test]
    async fn test_errors_map_to_core() {
        let adapter = ReasonerAdapter::new(RecordingBackend {
            seen: Mutex::new(Vec::new()),
            reply: Err(|| LlmError::Timeout),
        });
        let err = adapter.invoke("x").await.unwrap_err();
        assert!(matches!(err, pronunciation_core::Error::Timeout(_)));
        assert!(!adapter.is_available().await);

        let adapter = ReasonerAdapter::new(RecordingBackend {
            seen: Mutex::new(Vec::new()),
            reply: Err(|| LlmError::Api("HTTP 401".into())),
        });
        let err = adapter.invoke("x").await.unwrap_err();
        assert!(matches!(err, pronunciation_core::Error::Reasoning(_)));
    }
}
