//! Metric names shared by the engine and the HTTP layer.

/// Completed analyses (counter, labels: source, pattern_type).
pub const ANALYSES_TOTAL: &str = "pronunciation_analyses_total";
/// End-to-end analysis duration (histogram).
pub const ANALYSIS_DURATION_SECONDS: &str = "pronunciation_analysis_duration_seconds";
/// Per-stage duration (histogram, labels: stage).
pub const STAGE_DURATION_SECONDS: &str = "pronunciation_stage_duration_seconds";
/// Analyses that failed (counter, labels: stage).
pub const ANALYSIS_ERRORS_TOTAL: &str = "pronunciation_analysis_errors_total";
/// Rejected uploads (counter, labels: reason).
pub const UPLOAD_REJECTIONS_TOTAL: &str = "pronunciation_upload_rejections_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_snake_case() {
        for name in [
            ANALYSES_TOTAL,
            ANALYSIS_DURATION_SECONDS,
            STAGE_DURATION_SECONDS,
            ANALYSIS_ERRORS_TOTAL,
            UPLOAD_REJECTIONS_TOTAL,
        ] {
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{name}");
        }
    }
}
