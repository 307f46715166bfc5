//! End-to-end router tests with fake transcription, retrieval and reasoning

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use pronunciation_analysis::{AnalysisContext, DecisionEngine, PatternSource, PatternTables};
use pronunciation_config::{RuntimeEnvironment, Settings};
use pronunciation_core::{
    AudioClip, Error, Reasoner, Result, Retriever, RuleDocumentChunk, SpeechToText, Transcript,
};
use pronunciation_server::{create_router, AppState};

const BOUNDARY: &str = "pronunciation-test-boundary";

const CORRECT_REPLY: &str =
    r#"{"result":"Correct pronunciation","correct_pronunciation":null,"feedback":null}"#;

struct FakeStt {
    reply: std::result::Result<String, String>,
    calls: AtomicUsize,
}

impl FakeStt {
    fn saying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechToText for FakeStt {
    async fn transcribe(&self, _audio: &AudioClip) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map(Transcript::new)
            .map_err(Error::Transcription)
    }

    fn model_name(&self) -> &str {
        "fake-whisper"
    }
}

struct OneRuleRetriever;

#[async_trait]
impl Retriever for OneRuleRetriever {
    async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<RuleDocumentChunk>> {
        Ok(vec![RuleDocumentChunk {
            id: "Liaison#0".into(),
            rule_name: "Liaison".into(),
            text: "Rule: Liaison\nDescription: a final consonant moves to the next syllable"
                .into(),
            ordinal: 0,
            score: 0.9,
        }])
    }

    fn len(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "one-rule"
    }
}

struct CannedReasoner(&'static str);

#[async_trait]
impl Reasoner for CannedReasoner {
    async fn invoke(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.to_string())
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

/// Reasoner whose backend never answers
struct UnreachableReasoner;

#[async_trait]
impl Reasoner for UnreachableReasoner {
    async fn invoke(&self, _prompt: &str) -> Result<String> {
        Err(Error::Reasoning("connection refused".into()))
    }

    async fn is_available(&self) -> bool {
        false
    }

    fn model_name(&self) -> &str {
        "unreachable"
    }
}

fn app_with(stt: Arc<FakeStt>, reply: &'static str, environment: RuntimeEnvironment) -> Router {
    app_with_reasoner(stt, Arc::new(CannedReasoner(reply)), environment)
}

fn app_with_reasoner(
    stt: Arc<FakeStt>,
    reasoner: Arc<dyn Reasoner>,
    environment: RuntimeEnvironment,
) -> Router {
    let context = AnalysisContext::new(
        Arc::new(OneRuleRetriever),
        reasoner,
        PatternTables::defaults(),
    );
    let engine = DecisionEngine::new(context).unwrap();

    let settings = Settings {
        environment,
        ..Settings::default()
    };

    create_router(AppState::new(
        settings,
        engine,
        stt,
        1,
        &PatternSource::Default,
    ))
}

fn app(stt: Arc<FakeStt>) -> Router {
    app_with(stt, CORRECT_REPLY, RuntimeEnvironment::Development)
}

/// Multipart body with an optional audio part and optional text fields
fn multipart_request(audio_name: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = Vec::new();

    if let Some(name) = audio_name {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"audio\"; filename=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"RIFF\x24\x00\x00\x00WAVEfmt ");
        body.extend_from_slice(b"\r\n");
    }

    for (key, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{key}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/analyze-pronunciation")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_reports_running() {
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(FakeStt::saying("안녕하세요")), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["message"], "Korean Pronunciation Analysis API is running");
}

#[tokio::test]
async fn test_readiness_reports_startup_facts() {
    let request = Request::builder()
        .uri("/api/ready")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(FakeStt::saying("안녕하세요")), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["reasoning_backend"], "ok");
    assert_eq!(body["corpus"]["rules"], 1);
    assert_eq!(body["patterns"]["source"], "default");
    assert_eq!(body["models"]["transcription"], "fake-whisper");
    assert_eq!(body["models"]["reasoning"], "canned");
}

#[tokio::test]
async fn test_readiness_unavailable_when_reasoner_unreachable() {
    let app = app_with_reasoner(
        FakeStt::saying("안녕하세요"),
        Arc::new(UnreachableReasoner),
        RuntimeEnvironment::Development,
    );
    let request = Request::builder()
        .uri("/api/ready")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["checks"]["reasoning_backend"], "unreachable");
    assert_eq!(body["models"]["reasoning"], "unreachable");
}

#[tokio::test]
async fn test_unsupported_extension_is_rejected_before_transcription() {
    let stt = FakeStt::saying("안녕하세요");
    let (status, body) = send(app(stt.clone()), multipart_request(Some("clip.xyz"), &[])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Unsupported file format."));
    assert!(message.contains("wav"));
    assert_eq!(stt.calls(), 0);
}

#[tokio::test]
async fn test_missing_audio_is_rejected() {
    let stt = FakeStt::saying("안녕하세요");
    let request = multipart_request(None, &[("expected_text", "안녕하세요")]);
    let (status, body) = send(app(stt.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No audio file provided");
    assert_eq!(stt.calls(), 0);
}

#[tokio::test]
async fn test_correct_pronunciation_has_only_result() {
    let stt = FakeStt::saying("안녕하세요");
    let (status, body) = send(app(stt.clone()), multipart_request(Some("clip.wav"), &[])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"result": "Correct pronunciation"}));
    assert_eq!(stt.calls(), 1);
}

#[tokio::test]
async fn test_tensification_pattern_overrides_correct_reply() {
    let stt = FakeStt::saying("만나서 반갑습니다");
    let request = multipart_request(Some("clip.m4a"), &[("expected_text", "만나서 반갑습니다")]);
    let (status, body) = send(app(stt), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Incorrect pronunciation.");
    assert!(body["feedback"].as_str().unwrap().contains("Tensification"));
    assert!(body["correct_pronunciation"].as_str().is_some());
}

#[tokio::test]
async fn test_reasoner_incorrect_verdict_is_returned() {
    let reply = r#"{"result":"Incorrect pronunciation","correct_pronunciation":"an-nyeong","feedback":"Vowel too short"}"#;
    let app = app_with(
        FakeStt::saying("안녕하세요"),
        reply,
        RuntimeEnvironment::Development,
    );
    let (status, body) = send(app, multipart_request(Some("clip.webm"), &[])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({
            "result": "Incorrect pronunciation.",
            "correct_pronunciation": "an-nyeong",
            "feedback": "Vowel too short"
        })
    );
}

#[tokio::test]
async fn test_blank_transcription_is_unprocessable() {
    let (status, body) = send(
        app(FakeStt::saying("   ")),
        multipart_request(Some("clip.wav"), &[]),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "No speech detected in audio");
}

#[tokio::test]
async fn test_transcription_failure_is_bad_gateway_with_details_in_development() {
    let (status, body) = send(
        app(FakeStt::failing("whisper returned HTTP 500")),
        multipart_request(Some("clip.wav"), &[]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Something went wrong");
    assert!(body["details"].as_str().unwrap().contains("HTTP 500"));
}

#[tokio::test]
async fn test_transcription_failure_hides_details_in_production() {
    let app = app_with(
        FakeStt::failing("whisper returned HTTP 500"),
        CORRECT_REPLY,
        RuntimeEnvironment::Production,
    );
    let (status, body) = send(app, multipart_request(Some("clip.wav"), &[])).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Something went wrong");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_metrics_endpoint_is_empty_without_exporter() {
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(FakeStt::saying("안녕하세요")), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::Value::Null);
}
