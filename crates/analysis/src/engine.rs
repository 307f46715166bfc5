//! Decision engine
//!
//! One sequential pass per request: retrieve rule context, match patterns,
//! compose the prompt, invoke the reasoner, then resolve. All shared state
//! lives in an immutable [`AnalysisContext`] built at startup.

use std::sync::Arc;
use std::time::Instant;

use pronunciation_core::{AnalysisRequest, AnalysisResult, PatternMatch, Reasoner, Retriever};
use pronunciation_llm::PronunciationPrompt;

use crate::decision::{resolve, Decision, DecisionSource};
use crate::matcher::match_patterns;
use crate::metric_names as names;
use crate::parser::OutputParser;
use crate::patterns::PatternTables;
use crate::AnalysisError;

/// Engine tuning
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Rule chunks retrieved per analysis
    pub top_k: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Process-wide collaborators shared by every analysis
#[derive(Clone)]
pub struct AnalysisContext {
    pub retriever: Arc<dyn Retriever>,
    pub reasoner: Arc<dyn Reasoner>,
    pub patterns: Arc<PatternTables>,
    pub config: AnalysisConfig,
}

impl AnalysisContext {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        reasoner: Arc<dyn Reasoner>,
        patterns: PatternTables,
    ) -> Self {
        Self {
            retriever,
            reasoner,
            patterns: Arc::new(patterns),
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }
}

/// Pronunciation decision engine
pub struct DecisionEngine {
    context: AnalysisContext,
    parser: OutputParser,
}

impl DecisionEngine {
    pub fn new(context: AnalysisContext) -> Result<Self, AnalysisError> {
        let parser = OutputParser::new().map_err(AnalysisError::Schema)?;
        Ok(Self { context, parser })
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    /// Run the pattern matcher alone
    pub fn match_patterns(&self, transcription: &str) -> PatternMatch {
        match_patterns(transcription, &self.context.patterns)
    }

    /// Analyze and return only the result
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        Ok(self.evaluate(request).await?.result)
    }

    /// Analyze and report which branch decided
    pub async fn evaluate(&self, request: &AnalysisRequest) -> Result<Decision, AnalysisError> {
        let transcription = request.transcription.trim();
        if transcription.is_empty() {
            return Err(AnalysisError::EmptyTranscription);
        }

        let start = Instant::now();

        let chunks = self
            .context
            .retriever
            .retrieve(transcription, self.context.config.top_k)
            .await
            .map_err(AnalysisError::Retrieval)?;
        metrics::histogram!(names::STAGE_DURATION_SECONDS, "stage" => "retrieve")
            .record(start.elapsed().as_secs_f64());

        let pattern_match = self.match_patterns(transcription);

        let prompt = PronunciationPrompt::new(transcription)
            .with_expected_text(request.expected_text.as_deref())
            .with_rules(&chunks)
            .with_pattern_match(&pattern_match)
            .with_format_instructions(self.parser.format_instructions());

        let reason_start = Instant::now();
        let raw = self
            .context
            .reasoner
            .invoke(&prompt.build())
            .await
            .map_err(AnalysisError::Reasoning)?;
        metrics::histogram!(names::STAGE_DURATION_SECONDS, "stage" => "reason")
            .record(reason_start.elapsed().as_secs_f64());

        let parsed = self.parser.parse(&raw);
        if let Err(error) = &parsed {
            tracing::warn!(%error, raw_len = raw.len(), "Reasoning response could not be parsed");
        }

        let decision = resolve(&pattern_match, parsed);

        match decision.source {
            DecisionSource::PatternOverride => tracing::info!(
                pattern_type = %decision.pattern_type,
                matches = pattern_match.matches.len(),
                "Pattern override applied"
            ),
            _ => tracing::debug!(source = %decision.source, "Reasoner decision used"),
        }

        metrics::counter!(
            names::ANALYSES_TOTAL,
            "source" => decision.source.as_str(),
            "pattern_type" => decision.pattern_type.as_str()
        )
        .increment(1);
        metrics::histogram!(names::ANALYSIS_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());

        tracing::info!(
            result = %decision.result.result,
            source = %decision.source,
            chunks = chunks.len(),
            comparison = prompt.is_comparison(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pronunciation analysis complete"
        );

        Ok(decision)
    }
}
