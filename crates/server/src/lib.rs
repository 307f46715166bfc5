//! Pronunciation Analysis Server
//!
//! HTTP endpoints for uploading a spoken clip and receiving a verdict.

pub mod http;
pub mod metrics;
pub mod pronunciation;
pub mod state;

pub use http::create_router;
pub use crate::metrics::init_metrics;
pub use state::{AppState, ReadinessInfo};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pronunciation_analysis::AnalysisError;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("No audio file provided")]
    MissingAudio,

    #[error("Unsupported file format. Supported formats: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Upload exceeds the maximum allowed size")]
    PayloadTooLarge,

    #[error("No speech detected in audio")]
    NoSpeech,

    /// A transcription, embedding or reasoning provider failed
    #[error("Upstream provider failed")]
    Upstream { details: Option<String> },

    #[error("Internal error")]
    Internal { details: Option<String> },
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::MissingAudio
            | ServerError::UnsupportedFormat(_)
            | ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NoSpeech => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ServerError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a provider error; `expose` controls whether the cause is returned
    pub fn from_core(err: &pronunciation_core::Error, expose: bool) -> Self {
        let details = expose.then(|| err.to_string());
        if err.is_upstream() {
            ServerError::Upstream { details }
        } else {
            ServerError::Internal { details }
        }
    }

    pub fn from_analysis(err: &AnalysisError, expose: bool) -> Self {
        if matches!(err, AnalysisError::EmptyTranscription) {
            return ServerError::NoSpeech;
        }
        let details = expose.then(|| err.to_string());
        if err.is_upstream() {
            ServerError::Upstream { details }
        } else {
            ServerError::Internal { details }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ServerError::Upstream { details } | ServerError::Internal { details } => {
                let mut body = serde_json::json!({
                    "status": "error",
                    "message": "Something went wrong",
                });
                if let Some(details) = details {
                    body["details"] = serde_json::Value::String(details.clone());
                }
                body
            }
            other => serde_json::json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServerError::MissingAudio.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::NoSpeech.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let upstream = pronunciation_core::Error::Transcription("whisper down".into());
        assert_eq!(
            ServerError::from_core(&upstream, false).status(),
            StatusCode::BAD_GATEWAY
        );

        let local = pronunciation_core::Error::Retrieval("index".into());
        assert_eq!(
            ServerError::from_core(&local, false).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_details_only_when_exposed() {
        let err = pronunciation_core::Error::Reasoning("HTTP 500".into());
        assert!(matches!(
            ServerError::from_core(&err, false),
            ServerError::Upstream { details: None }
        ));
        match ServerError::from_core(&err, true) {
            ServerError::Upstream { details: Some(d) } => assert!(d.contains("HTTP 500")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_empty_transcription_is_no_speech() {
        assert!(matches!(
            ServerError::from_analysis(&AnalysisError::EmptyTranscription, true),
            ServerError::NoSpeech
        ));
    }
}
