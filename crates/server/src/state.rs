//! Application State
//!
//! Shared, read-only state across all handlers. Everything here is built
//! once at startup.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use pronunciation_analysis::{DecisionEngine, PatternSource};
use pronunciation_config::Settings;
use pronunciation_core::SpeechToText;
use serde::Serialize;

/// Startup facts reported by `/api/ready`
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessInfo {
    pub rules: usize,
    pub chunks: usize,
    pub tensification_patterns: usize,
    pub h_liaison_patterns: usize,
    pub vowel_confusion_patterns: usize,
    pub pattern_source: String,
    pub reasoning_model: String,
    pub transcription_model: String,
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub engine: Arc<DecisionEngine>,
    pub stt: Arc<dyn SpeechToText>,
    pub metrics: Option<PrometheusHandle>,
    pub readiness: Arc<ReadinessInfo>,
}

impl AppState {
    pub fn new(
        config: Settings,
        engine: DecisionEngine,
        stt: Arc<dyn SpeechToText>,
        rules: usize,
        pattern_source: &PatternSource,
    ) -> Self {
        let context = engine.context();
        let readiness = ReadinessInfo {
            rules,
            chunks: context.retriever.len(),
            tensification_patterns: context.patterns.tensification_patterns.len(),
            h_liaison_patterns: context.patterns.h_liaison_patterns.len(),
            vowel_confusion_patterns: context.patterns.vowel_confusion_patterns.len(),
            pattern_source: pattern_source.to_string(),
            reasoning_model: context.reasoner.model_name().to_string(),
            transcription_model: stt.model_name().to_string(),
        };

        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            stt,
            metrics: None,
            readiness: Arc::new(readiness),
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Whether 5xx bodies may carry error details
    pub fn expose_error_details(&self) -> bool {
        !self.config.environment.is_production()
    }
}
