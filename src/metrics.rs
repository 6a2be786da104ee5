use crate::{ErrorKind, ExtractionError};
use metrics::{counter, histogram, increment_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use tracing::info;

/// Which pass produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Static,
    Dynamic,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Static => "static",
            Strategy::Dynamic => "dynamic",
        }
    }
}

/// Records extraction outcomes through the `metrics` facade.
///
/// Without an installed recorder every call is a no-op, so library users pay
/// nothing unless they opt into an exporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Metrics;

impl Metrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_extraction(&self, strategy: Strategy, duration: Duration, image_count: usize) {
        increment_counter!("image_extractions_total", "strategy" => strategy.as_str());
        histogram!(
            "image_extraction_duration_seconds",
            duration.as_secs_f64(),
            "strategy" => strategy.as_str()
        );
        histogram!(
            "image_extraction_images",
            image_count as f64,
            "strategy" => strategy.as_str()
        );
    }

    pub fn record_escalation(&self) {
        counter!("image_extraction_escalations_total", 1);
    }

    pub fn record_failure(&self, error: &ExtractionError) {
        let kind: ErrorKind = error.kind();
        increment_counter!("image_extraction_failures_total", "kind" => kind.as_str());
    }
}

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, ExtractionError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ExtractionError::ConfigurationError(e.to_string()))?;

    info!("Prometheus metrics recorder installed");
    Ok(handle)
}
