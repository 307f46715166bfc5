//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{data, endpoints, models, rag, timeouts, upload};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Error responses include internal details
    #[default]
    Development,
    Staging,
    /// Error details suppressed, API keys required
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Parse loosely from `APP_ENV`/`NODE_ENV` style values
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" | "test" => Some(Self::Development),
            "staging" | "stage" => Some(Self::Staging),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Reasoning backend (chat model)
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub transcription: TranscriptionConfig,

    #[serde(default)]
    pub rag: RagConfig,

    /// Static data files
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_reasoning()?;
        self.validate_rag()?;
        self.validate_credentials()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout cannot be 0".to_string(),
            });
        }

        if server.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_upload_bytes".to_string(),
                message: "Upload limit cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    fn validate_reasoning(&self) -> Result<(), ConfigError> {
        let reasoning = &self.reasoning;

        if !(0.0..=2.0).contains(&reasoning.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "reasoning.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", reasoning.temperature),
            });
        }

        if reasoning.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reasoning.timeout_secs".to_string(),
                message: "Timeout cannot be 0".to_string(),
            });
        }

        if self.embedding.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "embedding.timeout_secs".to_string(),
                message: "Timeout cannot be 0".to_string(),
            });
        }

        if self.transcription.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "transcription.timeout_secs".to_string(),
                message: "Timeout cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    fn validate_rag(&self) -> Result<(), ConfigError> {
        let rag = &self.rag;

        if rag.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.chunk_size".to_string(),
                message: "Chunk size cannot be 0".to_string(),
            });
        }

        if rag.chunk_overlap >= rag.chunk_size {
            return Err(ConfigError::InvalidValue {
                field: "rag.chunk_overlap".to_string(),
                message: format!(
                    "Overlap ({}) must be smaller than chunk size ({})",
                    rag.chunk_overlap, rag.chunk_size
                ),
            });
        }

        if rag.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.top_k".to_string(),
                message: "top_k cannot be 0".to_string(),
            });
        }

        if self.embedding.dim == 0 {
            return Err(ConfigError::InvalidValue {
                field: "embedding.dim".to_string(),
                message: "Embedding dimension cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    /// Remote OpenAI providers need a key in production; elsewhere a missing
    /// key only fails at request time.
    fn validate_credentials(&self) -> Result<(), ConfigError> {
        if !self.environment.is_production() {
            return Ok(());
        }

        let missing = |key: &Option<String>| key.as_deref().map_or(true, str::is_empty);

        if self.reasoning.provider == ReasoningProvider::OpenAi && missing(&self.reasoning.api_key) {
            return Err(ConfigError::MissingField("reasoning.api_key".to_string()));
        }

        if self.embedding.provider == EmbeddingProvider::OpenAi && missing(&self.embedding.api_key) {
            return Err(ConfigError::MissingField("embedding.api_key".to_string()));
        }

        if missing(&self.transcription.api_key) {
            return Err(ConfigError::MissingField("transcription.api_key".to_string()));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Falls back to `PORT`, then 3000
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    /// Maximum accepted multipart body size
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed origins; empty means permissive outside production
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    env_var("PORT").and_then(|p| p.parse().ok()).unwrap_or(3000)
}
fn default_request_timeout() -> u64 {
    timeouts::HTTP_REQUEST_SECS
}
fn default_max_upload_bytes() -> usize {
    upload::MAX_UPLOAD_BYTES
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_request_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

/// Reasoning backend provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningProvider {
    /// Chat completions on any OpenAI-compatible endpoint
    #[default]
    OpenAi,
    Ollama,
}

/// Reasoning backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    #[serde(default)]
    pub provider: ReasoningProvider,

    /// API base; provider default when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Falls back to `OPENAI_API_KEY`
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    /// Sent as `OpenAI-Organization`; falls back to `OPENAI_ORG_ID`
    #[serde(default = "default_organization")]
    pub organization: Option<String>,

    /// Falls back to `AI_MODEL`, then `gpt-4o`
    #[serde(default = "default_reasoning_model")]
    pub model: String,

    /// Falls back to `AI_TEMPERATURE`, then 0.1
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_reasoning_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt; 0 disables retrying
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_api_key() -> Option<String> {
    env_var("OPENAI_API_KEY")
}
fn default_organization() -> Option<String> {
    env_var("OPENAI_ORG_ID")
}
fn default_reasoning_model() -> String {
    env_var("AI_MODEL").unwrap_or_else(|| models::REASONING_DEFAULT.to_string())
}
fn default_temperature() -> f32 {
    env_var("AI_TEMPERATURE")
        .and_then(|t| t.parse().ok())
        .unwrap_or(models::TEMPERATURE_DEFAULT)
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_reasoning_timeout() -> u64 {
    timeouts::REASONING_SECS
}
fn default_max_retries() -> u32 {
    2
}
fn default_initial_backoff_ms() -> u64 {
    500
}

impl ReasoningConfig {
    /// Configured endpoint or the provider's default
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| match self.provider {
            ReasoningProvider::OpenAi => endpoints::OPENAI_DEFAULT.to_string(),
            ReasoningProvider::Ollama => endpoints::OLLAMA_DEFAULT.to_string(),
        })
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            provider: ReasoningProvider::default(),
            endpoint: None,
            api_key: default_api_key(),
            organization: default_organization(),
            model: default_reasoning_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_reasoning_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

/// Embedding provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    OpenAi,
    Ollama,
    /// Deterministic offline embedding, no network
    Hash,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_dim")]
    pub dim: usize,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_model() -> String {
    models::EMBEDDING_DEFAULT.to_string()
}
fn default_embedding_dim() -> usize {
    models::EMBEDDING_DIM_DEFAULT
}
fn default_embedding_timeout() -> u64 {
    timeouts::EMBEDDING_SECS
}

impl EmbeddingConfig {
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| match self.provider {
            EmbeddingProvider::Ollama => endpoints::OLLAMA_DEFAULT.to_string(),
            EmbeddingProvider::OpenAi | EmbeddingProvider::Hash => {
                endpoints::OPENAI_DEFAULT.to_string()
            }
        })
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            endpoint: None,
            api_key: default_api_key(),
            model: default_embedding_model(),
            dim: default_embedding_dim(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

/// Transcription provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_transcription_model")]
    pub model: String,

    /// ISO-639-1 language hint
    #[serde(default = "default_language")]
    pub language: String,

    /// Request word-level timestamps
    #[serde(default = "default_true")]
    pub word_timestamps: bool,

    #[serde(default = "default_transcription_timeout")]
    pub timeout_secs: u64,
}

fn default_openai_endpoint() -> String {
    endpoints::OPENAI_DEFAULT.to_string()
}
fn default_transcription_model() -> String {
    models::TRANSCRIPTION_DEFAULT.to_string()
}
fn default_language() -> String {
    "ko".to_string()
}
fn default_transcription_timeout() -> u64 {
    timeouts::TRANSCRIPTION_SECS
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_openai_endpoint(),
            api_key: default_api_key(),
            model: default_transcription_model(),
            language: default_language(),
            word_timestamps: default_true(),
            timeout_secs: default_transcription_timeout(),
        }
    }
}

/// Similarity metric for the rule index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks passed to the reasoning prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub distance: DistanceMetric,
}

fn default_chunk_size() -> usize {
    rag::CHUNK_SIZE
}
fn default_chunk_overlap() -> usize {
    rag::CHUNK_OVERLAP
}
fn default_top_k() -> usize {
    rag::DEFAULT_TOP_K
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            distance: DistanceMetric::default(),
        }
    }
}

/// Static data file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Falls back to `DATA_DIR`, then `data`
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_rules_file")]
    pub rules_file: String,

    #[serde(default = "default_patterns_file")]
    pub patterns_file: String,
}

fn default_data_dir() -> String {
    env_var("DATA_DIR").unwrap_or_else(|| data::DATA_DIR.to_string())
}
fn default_rules_file() -> String {
    data::RULES_FILE.to_string()
}
fn default_patterns_file() -> String {
    data::PATTERNS_FILE.to_string()
}

impl DataConfig {
    pub fn rules_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.rules_file)
    }

    pub fn patterns_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.patterns_file)
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rules_file: default_rules_file(),
            patterns_file: default_patterns_file(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    /// Install the Prometheus recorder and serve `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (PRONUNCIATION_ prefix, e.g. `PRONUNCIATION__SERVER__PORT`)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
/// 4. Conventional variables (`PORT`, `OPENAI_API_KEY`, `AI_MODEL`, ...) and built-in defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    if let Some(runtime) = env.and_then(RuntimeEnvironment::from_name) {
        builder = builder.set_default("environment", runtime.as_str())?;
    }

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("PRONUNCIATION")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        environment = settings.environment.as_str(),
        port = settings.server.port,
        "Settings loaded"
    );

    Ok(settings)
}
