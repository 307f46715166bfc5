//! Prometheus metrics recorder and `/metrics` endpoint handler.

use axum::{extract::State, http::header, response::IntoResponse};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

/// Install the global Prometheus recorder.
///
/// Returns `None` if a recorder is already installed; the server then runs
/// without `/metrics` output.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            tracing::info!("Prometheus metrics recorder installed");
            Some(handle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install metrics recorder");
            None
        }
    }
}

/// Render Prometheus text; empty when metrics are disabled
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default();

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use pronunciation_analysis::metric_names;

    #[test]
    fn test_render_includes_recorded_counter() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        assert!(!handle.render().contains(metric_names::UPLOAD_REJECTIONS_TOTAL));

        ::metrics::with_local_recorder(&recorder, || {
            ::metrics::counter!(metric_names::UPLOAD_REJECTIONS_TOTAL, "reason" => "missing_audio")
                .increment(2);
        });

        let output = handle.render();
        assert!(output.contains(metric_names::UPLOAD_REJECTIONS_TOTAL));
        assert!(output.contains("reason=\"missing_audio\""));
        assert!(output.contains(" 2"));
    }
}
