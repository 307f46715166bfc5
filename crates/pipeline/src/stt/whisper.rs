//! Whisper STT Backend
//!
//! Posts the uploaded clip to `{endpoint}/audio/transcriptions`. Word-level
//! timestamps are requested with `verbose_json`; if the provider rejects
//! that format the request is repeated once with plain `json`.

use async_trait::async_trait;
use pronunciation_core::{AudioClip, Result, SpeechToText, Transcript, WordTiming};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::PipelineError;

/// Whisper backend configuration
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// API base, e.g. `https://api.openai.com/v1`
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    /// ISO-639-1 language hint ("ko")
    pub language: String,
    pub word_timestamps: bool,
    pub timeout: Duration,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            endpoint: pronunciation_config::constants::endpoints::OPENAI_DEFAULT.to_string(),
            api_key: None,
            model: pronunciation_config::constants::models::TRANSCRIPTION_DEFAULT.to_string(),
            language: "ko".to_string(),
            word_timestamps: true,
            timeout: Duration::from_secs(
                pronunciation_config::constants::timeouts::TRANSCRIPTION_SECS,
            ),
        }
    }
}

impl WhisperConfig {
    pub fn from_settings(settings: &pronunciation_config::TranscriptionConfig) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            language: normalize_language(&settings.language),
            word_timestamps: settings.word_timestamps,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Providers expect "ko", not "ko-KR"
fn normalize_language(code: &str) -> String {
    code.split(['-', '_'])
        .next()
        .unwrap_or(code)
        .trim()
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseFormat {
    VerboseJson,
    Json,
}

impl ResponseFormat {
    fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::VerboseJson => "verbose_json",
            ResponseFormat::Json => "json",
        }
    }
}

/// Response body for both `json` and `verbose_json`
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f32>,
    #[serde(default)]
    words: Vec<WordEntry>,
}

#[derive(Debug, Deserialize)]
struct WordEntry {
    word: String,
    start: f32,
    end: f32,
}

impl From<TranscriptionResponse> for Transcript {
    fn from(resp: TranscriptionResponse) -> Self {
        Transcript {
            text: resp.text.trim().to_string(),
            language: resp.language,
            duration_secs: resp.duration,
            words: resp
                .words
                .into_iter()
                .map(|w| WordTiming {
                    word: w.word,
                    start: w.start,
                    end: w.end,
                })
                .collect(),
        }
    }
}

/// Whisper-compatible speech-to-text client
pub struct WhisperStt {
    client: Client,
    config: WhisperConfig,
}

impl WhisperStt {
    pub fn new(config: WhisperConfig) -> std::result::Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                PipelineError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    fn transcriptions_url(&self) -> String {
        format!(
            "{}/audio/transcriptions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    fn build_form(
        &self,
        audio: &AudioClip,
        format: ResponseFormat,
    ) -> std::result::Result<Form, PipelineError> {
        let part = Part::bytes(audio.bytes.clone())
            .file_name(audio.upload_name())
            .mime_str(audio.format.mime_type())
            .map_err(|e| PipelineError::Request(format!("Failed to create multipart: {}", e)))?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("response_format", format.as_str());

        if !self.config.language.is_empty() {
            form = form.text("language", self.config.language.clone());
        }
        if format == ResponseFormat::VerboseJson {
            form = form.text("timestamp_granularities[]", "word");
        }

        Ok(form)
    }

    async fn request(
        &self,
        audio: &AudioClip,
        format: ResponseFormat,
    ) -> std::result::Result<TranscriptionResponse, PipelineError> {
        let form = self.build_form(audio, format)?;

        let mut request = self.client.post(self.transcriptions_url()).multipart(form);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PipelineError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::InvalidResponse(e.to_string()))
    }

    async fn transcribe_inner(
        &self,
        audio: &AudioClip,
    ) -> std::result::Result<Transcript, PipelineError> {
        if !self.config.word_timestamps {
            return Ok(self.request(audio, ResponseFormat::Json).await?.into());
        }

        match self.request(audio, ResponseFormat::VerboseJson).await {
            Ok(resp) => Ok(resp.into()),
            Err(e) if should_fall_back(&e) => {
                tracing::warn!(
                    error = %e,
                    "Verbose transcription failed, falling back to plain json"
                );
                Ok(self.request(audio, ResponseFormat::Json).await?.into())
            }
            Err(e) => Err(e),
        }
    }
}

/// Retry with plain json only when the provider refused the request shape
fn should_fall_back(err: &PipelineError) -> bool {
    match err {
        PipelineError::Api { status, .. } => matches!(status, 400 | 415 | 422),
        PipelineError::InvalidResponse(_) => true,
        _ => false,
    }
}

#[async_trait]
impl SpeechToText for WhisperStt {
    async fn transcribe(&self, audio: &AudioClip) -> Result<Transcript> {
        let start = Instant::now();

        tracing::info!(
            format = %audio.format,
            bytes = audio.bytes.len(),
            model = %self.config.model,
            "Sending audio for transcription"
        );

        let transcript = self.transcribe_inner(audio).await?;

        tracing::info!(
            chars = transcript.text.chars().count(),
            words = transcript.words.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Transcription complete"
        );

        Ok(transcript)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
