//! LLM Backend implementations
//!
//! Non-streaming chat backends for the reasoning step. Both retry transient
//! failures with exponential backoff; 4xx responses fail immediately.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

use crate::prompt::Message;
use crate::LlmError;

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// API base (`https://api.openai.com/v1`, `http://localhost:11434`, ...)
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry)
    pub initial_backoff: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            endpoint: pronunciation_config::constants::endpoints::OPENAI_DEFAULT.to_string(),
            api_key: None,
            max_tokens: 1024,
            temperature: 0.1,
            timeout: Duration::from_secs(60),
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl LlmConfig {
    pub fn from_settings(settings: &pronunciation_config::ReasoningConfig) -> Self {
        Self {
            model: settings.model.clone(),
            endpoint: settings.resolved_endpoint(),
            api_key: settings.api_key.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
        }
    }
}

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    /// Completion tokens, when the provider reports them
    pub tokens: usize,
    pub total_time_ms: u64,
    /// Attempts made, including the successful one
    pub attempts: u32,
}

/// LLM Backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a response
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError>;

    /// Check if the backend answers at all
    async fn is_available(&self) -> bool;

    fn model_name(&self) -> &str;
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. Returns the value and the number of attempts.
pub(crate) async fn with_retry<T, F, Fut>(
    config: &LlmConfig,
    mut op: F,
) -> Result<(T, u32), LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut last_error = None;
    let mut backoff = config.initial_backoff;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            tracing::warn!(
                model = %config.model,
                attempt,
                max_retries = config.max_retries,
                backoff_ms = backoff.as_millis() as u64,
                "Reasoning request failed, retrying"
            );
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }

        match op().await {
            Ok(value) => return Ok((value, attempt + 1)),
            Err(e) if e.is_retryable() => last_error = Some(e),
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| LlmError::Network("Max retries exceeded".to_string())))
}

/// Map a non-success HTTP status to an error; 429 and 5xx are retryable
fn status_error(status: reqwest::StatusCode, body: String) -> LlmError {
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        LlmError::Network(format!("HTTP {}: {}", status, body))
    } else {
        LlmError::Api(format!("HTTP {}: {}", status, body))
    }
}

fn build_client(timeout: Duration) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

// =============================================================================
// Ollama Backend
// =============================================================================

/// Ollama backend (`/api/chat`, non-streaming)
pub struct OllamaBackend {
    client: Client,
    config: LlmConfig,
}

impl OllamaBackend {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = build_client(config.timeout)?;
        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    async fn execute_request(
        &self,
        request: &OllamaChatRequest,
    ) -> Result<OllamaChatResponse, LlmError> {
        let response = self
            .client
            .post(self.api_url("/chat"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();

        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            stream: false,
            format: Some("json".to_string()),
            options: Some(OllamaOptions {
                temperature: Some(self.config.temperature),
                num_predict: Some(self.config.max_tokens as i32),
            }),
        };

        let (response, attempts) = with_retry(&self.config, || self.execute_request(&request)).await?;

        Ok(GenerationResult {
            text: response.message.content,
            tokens: response.eval_count.unwrap_or(0) as usize,
            total_time_ms: start.elapsed().as_millis() as u64,
            attempts,
        })
    }

    async fn is_available(&self) -> bool {
        match self.client.get(self.api_url("/tags")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Ollama API types
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    /// Constrain output to JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

// =============================================================================
// OpenAI-compatible Backend
// =============================================================================

/// Configuration for OpenAI-compatible backends
#[derive(Debug, Clone, Default)]
pub struct OpenAIConfig {
    pub llm: LlmConfig,
    /// Organization ID (OpenAI specific)
    pub organization: Option<String>,
}

impl OpenAIConfig {
    pub fn from_settings(settings: &pronunciation_config::ReasoningConfig) -> Self {
        Self {
            llm: LlmConfig::from_settings(settings),
            organization: settings.organization.clone().filter(|o| !o.is_empty()),
        }
    }
}

impl From<LlmConfig> for OpenAIConfig {
    fn from(llm: LlmConfig) -> Self {
        Self {
            llm,
            organization: None,
        }
    }
}

/// OpenAI-compatible backend
///
/// Works with OpenAI, vLLM and other servers exposing `/chat/completions`.
pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIBackend {
    pub fn new(config: impl Into<OpenAIConfig>) -> Result<Self, LlmError> {
        let config = config.into();
        let has_key = config.llm.api_key.as_deref().is_some_and(|k| !k.is_empty());
        let is_local = config.llm.endpoint.starts_with("http://localhost")
            || config.llm.endpoint.starts_with("http://127.0.0.1");

        if !has_key && !is_local {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = build_client(config.llm.timeout)?;
        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.llm.endpoint.trim_end_matches('/')
        )
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::HeaderValue;

        let mut headers = reqwest::header::HeaderMap::new();

        if let Some(key) = self.config.llm.api_key.as_deref().filter(|k| !k.is_empty()) {
            if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", key)) {
                headers.insert(reqwest::header::AUTHORIZATION, val);
            }
        }

        if let Some(ref org) = self.config.organization {
            if let Ok(val) = HeaderValue::from_str(org) {
                headers.insert("OpenAI-Organization", val);
            }
        }

        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        headers
    }

    async fn execute_request(
        &self,
        request: &OpenAIChatRequest,
    ) -> Result<OpenAIChatResponse, LlmError> {
        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmBackend for OpenAIBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();

        let request = OpenAIChatRequest {
            model: self.config.llm.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            max_tokens: Some(self.config.llm.max_tokens),
            temperature: Some(self.config.llm.temperature),
            stream: Some(false),
        };

        let (response, attempts) =
            with_retry(&self.config.llm, || self.execute_request(&request)).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        Ok(GenerationResult {
            text: choice.message.content,
            tokens: response.usage.map(|u| u.completion_tokens).unwrap_or(0),
            total_time_ms: start.elapsed().as_millis() as u64,
            attempts,
        })
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.config.llm.endpoint.trim_end_matches('/'));
        match self.client.get(url).headers(self.build_headers()).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model_name(&self) -> &str {
        &self.config.llm.model
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_retry(max_retries: u32) -> LlmConfig {
        LlmConfig {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let calls = AtomicU32::new(0);
        let (value, attempts) = with_retry(&fast_retry(3), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LlmError::Network("connection reset".into()))
            } else {
                Ok("ok")
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "ok");
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_stops_on_api_error() {
        let calls = AtomicU32::new(0);
        let result: Result<((), u32), _> = with_retry(&fast_retry(3), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Api("HTTP 401".into()))
        })
        .await;

        assert!(matches!(result, Err(LlmError::Api(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_when_disabled() {
        let calls = AtomicU32::new(0);
        let result: Result<((), u32), _> = with_retry(&fast_retry(0), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Timeout)
        })
        .await;

        assert!(matches!(result, Err(LlmError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_status_error_classification() {
        assert!(status_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, String::new()).is_retryable());
        assert!(status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, String::new()).is_retryable());
        assert!(!status_error(reqwest::StatusCode::BAD_REQUEST, String::new()).is_retryable());
    }

    #[test]
    fn test_openai_requires_key_for_remote() {
        let config = LlmConfig {
            api_key: None,
            ..LlmConfig::default()
        };
        assert!(matches!(
            OpenAIBackend::new(config),
            Err(LlmError::Configuration(_))
        ));

        let local = LlmConfig {
            api_key: None,
            endpoint: "http://localhost:8000/v1".into(),
            ..LlmConfig::default()
        };
        assert!(OpenAIBackend::new(local).is_ok());
    }

    #[test]
    fn test_openai_chat_url() {
        let backend = OpenAIBackend::new(LlmConfig {
            api_key: Some("sk-test".into()),
            endpoint: "https://api.openai.com/v1/".into(),
            ..LlmConfig::default()
        })
        .unwrap();
        assert_eq!(backend.chat_url(), "https://api.openai.com/v1/chat/completions");

        let headers = backend.build_headers();
        assert_eq!(
            headers.get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer sk-test"
        );
        assert!(headers.get("OpenAI-Organization").is_none());
    }

    #[test]
    fn test_organization_header_from_settings() {
        let settings = pronunciation_config::ReasoningConfig {
            api_key: Some("sk-test".into()),
            organization: Some("org-hangeul".into()),
            ..Default::default()
        };
        let config = OpenAIConfig::from_settings(&settings);
        assert_eq!(config.organization.as_deref(), Some("org-hangeul"));

        let backend = OpenAIBackend::new(config).unwrap();
        assert_eq!(
            backend.build_headers().get("OpenAI-Organization").unwrap(),
            "org-hangeul"
        );

        let blank = pronunciation_config::ReasoningConfig {
            organization: Some(String::new()),
            ..settings
        };
        assert!(OpenAIConfig::from_settings(&blank).organization.is_none());
    }

    #[test]
    fn test_openai_request_serialization() {
        let request = OpenAIChatRequest {
            model: "gpt-4o".into(),
            messages: vec![ChatMessage::from(&Message::user("분석해 주세요"))],
            max_tokens: Some(1024),
            temperature: Some(0.1),
            stream: Some(false),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_ollama_request_serialization() {
        let request = OllamaChatRequest {
            model: "qwen2.5:7b".into(),
            messages: vec![ChatMessage::from(&Message::user("hi"))],
            stream: false,
            format: Some("json".into()),
            options: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["format"], "json");
        assert!(json.get("options").is_none());
    }

    #[test]
    fn test_openai_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"{\"result\":\"Correct pronunciation\"}"},"finish_reason":"stop"}],"usage":{"completion_tokens":9,"prompt_tokens":100,"total_tokens":109}}"#;
        let parsed: OpenAIChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.usage.unwrap().completion_tokens, 9);
        assert!(parsed.choices[0].message.content.contains("Correct"));
    }
}
