//! Pronunciation analysis endpoint
//!
//! `POST /api/analyze-pronunciation` accepts a multipart form with an
//! `audio` file and an optional `expected_text` field.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::time::Instant;
use tracing::Instrument;

use pronunciation_analysis::metric_names;
use pronunciation_core::{AnalysisRequest, AnalysisResult, AudioClip, AudioFormat, Verdict};

use crate::state::AppState;
use crate::ServerError;

/// Response body; the incorrect verdict carries a trailing period
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Correct {
        result: &'static str,
    },
    Incorrect {
        result: &'static str,
        correct_pronunciation: Option<String>,
        feedback: Option<String>,
    },
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(result: AnalysisResult) -> Self {
        match result.result {
            Verdict::Correct => AnalyzeResponse::Correct {
                result: "Correct pronunciation",
            },
            Verdict::Incorrect => AnalyzeResponse::Incorrect {
                result: "Incorrect pronunciation.",
                correct_pronunciation: result.correct_pronunciation,
                feedback: result.feedback,
            },
        }
    }
}

/// Validated form contents
#[derive(Debug)]
pub struct AnalysisUpload {
    pub clip: AudioClip,
    pub expected_text: Option<String>,
}

fn reject(reason: &'static str, err: ServerError) -> ServerError {
    ::metrics::counter!(metric_names::UPLOAD_REJECTIONS_TOTAL, "reason" => reason).increment(1);
    tracing::debug!(reason, "Upload rejected");
    err
}

fn multipart_error(err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        reject("too_large", ServerError::PayloadTooLarge)
    } else {
        reject("malformed", ServerError::InvalidRequest(err.body_text()))
    }
}

/// Resolve the format from the file name, then the declared content type
fn detect_format(file_name: Option<&str>, content_type: Option<&str>) -> Option<AudioFormat> {
    match file_name {
        Some(name) if name.contains('.') => AudioFormat::from_file_name(name),
        _ => content_type.and_then(|ct| {
            AudioFormat::ALL
                .iter()
                .copied()
                .find(|f| f.mime_type().eq_ignore_ascii_case(ct))
        }),
    }
}

/// Read the multipart form; rejects before any transcription happens
pub async fn read_upload(mut multipart: Multipart) -> Result<AnalysisUpload, ServerError> {
    let mut clip = None;
    let mut expected_text = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);

                let format = detect_format(file_name.as_deref(), content_type.as_deref())
                    .ok_or_else(|| {
                        reject(
                            "unsupported_format",
                            ServerError::UnsupportedFormat(AudioFormat::supported_list()),
                        )
                    })?;

                let bytes = field.bytes().await.map_err(multipart_error)?;
                if bytes.is_empty() {
                    continue;
                }

                let mut audio = AudioClip::new(bytes.to_vec(), format);
                if let Some(name) = file_name {
                    audio = audio.with_file_name(name);
                }
                clip = Some(audio);
            }
            Some("expected_text") | Some("expectedText") => {
                let text = field.text().await.map_err(multipart_error)?;
                expected_text = Some(text);
            }
            _ => {}
        }
    }

    let clip = clip.ok_or_else(|| reject("missing_audio", ServerError::MissingAudio))?;

    Ok(AnalysisUpload {
        clip,
        expected_text: expected_text.filter(|t| !t.trim().is_empty()),
    })
}

/// Handle an analysis upload
pub async fn analyze_pronunciation(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ServerError> {
    let multipart = multipart
        .map_err(|e| reject("malformed", ServerError::InvalidRequest(e.body_text())))?;

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("analyze_pronunciation", %request_id);

    async move {
        let start = Instant::now();
        let upload = read_upload(multipart).await?;
        let expose = state.expose_error_details();

        tracing::info!(
            format = %upload.clip.format,
            bytes = upload.clip.bytes.len(),
            has_expected_text = upload.expected_text.is_some(),
            "Audio received"
        );

        let transcript = state.stt.transcribe(&upload.clip).await.map_err(|e| {
            tracing::error!(error = %e, "Transcription failed");
            ::metrics::counter!(metric_names::ANALYSIS_ERRORS_TOTAL, "stage" => "transcribe")
                .increment(1);
            ServerError::from_core(&e, expose)
        })?;
        ::metrics::histogram!(metric_names::STAGE_DURATION_SECONDS, "stage" => "transcribe")
            .record(start.elapsed().as_secs_f64());

        if transcript.is_blank() {
            tracing::info!("Transcription is empty");
            return Err(ServerError::NoSpeech);
        }

        tracing::info!(transcription = %transcript.text, "Transcription complete");

        let request =
            AnalysisRequest::new(transcript.text).with_expected_text(upload.expected_text);

        let result = state.engine.analyze(&request).await.map_err(|e| {
            tracing::error!(error = %e, "Pronunciation analysis failed");
            ::metrics::counter!(metric_names::ANALYSIS_ERRORS_TOTAL, "stage" => "analyze")
                .increment(1);
            ServerError::from_analysis(&e, expose)
        })?;

        tracing::info!(
            result = %result.result,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request complete"
        );

        Ok(Json(AnalyzeResponse::from(result)))
    }
    .instrument(span)
    .await
}
