//! HTTP Endpoints
//!
//! Router assembly plus the health and readiness handlers.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::pronunciation::analyze_pronunciation;
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(
        &server.cors_origins,
        server.cors_enabled,
        state.config.environment.is_production(),
    );
    let body_limit = server.max_upload_bytes;
    let timeout = Duration::from_secs(server.timeout_seconds);

    Router::new()
        .route(
            "/api/analyze-pronunciation",
            post(analyze_pronunciation).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/health", get(health_check))
        .route("/api/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - Disabled: no cross-origin access is granted
/// - No origins outside production: permissive
/// - No valid origins in production: same-origin only
fn build_cors_layer(origins: &[String], enabled: bool, production: bool) -> CorsLayer {
    if !enabled {
        return CorsLayer::new();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(%origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        if production {
            tracing::warn!("No valid CORS origins configured in production");
            return CorsLayer::new();
        }
        tracing::info!("No CORS origins configured, allowing all origins");
        return CorsLayer::permissive();
    }

    tracing::info!(origins = parsed_origins.len(), "CORS configured");
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Liveness
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "message": "Korean Pronunciation Analysis API is running",
    }))
}

/// Bound on the reasoning backend availability check
const READINESS_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Startup summary plus reasoning backend reachability
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let reasoner = &state.engine.context().reasoner;
    let backend_status =
        match tokio::time::timeout(READINESS_CHECK_TIMEOUT, reasoner.is_available()).await {
            Ok(true) => "ok",
            Ok(false) => "unreachable",
            Err(_) => "timeout",
        };
    let ready = backend_status == "ok";
    if !ready {
        tracing::warn!(status = backend_status, "Reasoning backend not ready");
    }

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let info = &state.readiness;
    let body = Json(serde_json::json!({
        "status": if ready { "ready" } else { "not_ready" },
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment.as_str(),
        "corpus": {
            "rules": info.rules,
            "chunks": info.chunks,
        },
        "patterns": {
            "source": info.pattern_source,
            "tensification": info.tensification_patterns,
            "h_liaison": info.h_liaison_patterns,
            "vowel_confusion": info.vowel_confusion_patterns,
        },
        "models": {
            "reasoning": info.reasoning_model,
            "transcription": info.transcription_model,
        },
        "checks": {
            "reasoning_backend": backend_status,
        },
    }));

    (status_code, body)
}
