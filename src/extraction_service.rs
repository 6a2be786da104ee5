//! Extraction coordinator
//!
//! This module provides the `ExtractionService` that runs the two-tier
//! pipeline for one page: a single GET plus static parse, and a browser
//! render only when the static pass comes back empty or the caller asked
//! for it.

use crate::{
    extract_static, format_duration, BrowserLauncher, ChromiumLauncher, Config, DynamicExtractor,
    DynamicSettings, ExtractionError, ExtractionMode, ExtractionRequest, HttpFetcher, Metrics,
    PageFetcher, ResultSet, Strategy,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Why the coordinator went to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// The static pass found no usable image
    EmptyStaticResult,
    /// The request asked for the dynamic pass
    Requested,
}

/// Result of one extraction request.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    pub request_id: String,
    pub page_url: String,
    pub images: ResultSet,
    pub strategy: Strategy,
    pub escalation: Option<EscalationReason>,
    pub duration: Duration,
}

/// Two-tier image extraction service
///
/// Stateless across requests: every call fetches the page itself and, when
/// escalating, launches and closes its own browser session.
///
/// # Examples
///
/// ```rust,no_run
/// use image_extractor::{Config, ExtractionService};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = ExtractionService::new(Config::default())?;
///
///     let outcome = service.extract_url("https://example.com", false).await?;
///     for image in outcome.images.iter() {
///         println!("{image}");
///     }
///
///     Ok(())
/// }
/// ```
pub struct ExtractionService {
    fetcher: Arc<dyn PageFetcher>,
    dynamic: DynamicExtractor,
    metrics: Metrics,
}

impl ExtractionService {
    pub fn new(config: Config) -> Result<Self, ExtractionError> {
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        let launcher = Arc::new(ChromiumLauncher::new(config.clone()));
        Ok(Self::with_collaborators(&config, fetcher, launcher))
    }

    pub fn with_collaborators(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Self {
        Self {
            fetcher,
            dynamic: DynamicExtractor::new(launcher, DynamicSettings::from(config)),
            metrics: Metrics::new(),
        }
    }

    /// Validate raw inbound fields and run the pipeline.
    ///
    /// Invalid input is rejected before any network activity.
    pub async fn extract_url(
        &self,
        page_url: &str,
        dynamic: bool,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        let request = ExtractionRequest::new(page_url, ExtractionMode::from_dynamic_flag(dynamic))
            .inspect_err(|e| self.metrics.record_failure(e))?;
        self.extract(request).await
    }

    pub async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        let start_time = Instant::now();
        info!(
            "[{}] Extracting images from {} ({:?})",
            request.id, request.page_url, request.mode
        );

        let result = self.run_pipeline(&request).await;
        let duration = start_time.elapsed();

        match result {
            Ok((images, strategy, escalation)) => {
                self.metrics.record_extraction(strategy, duration, images.len());
                info!(
                    "[{}] Found {} images via {} pass in {}",
                    request.id,
                    images.len(),
                    strategy.as_str(),
                    format_duration(duration)
                );

                Ok(ExtractionOutcome {
                    request_id: request.id,
                    page_url: request.page_url.to_string(),
                    images,
                    strategy,
                    escalation,
                    duration,
                })
            }
            Err(e) => {
                self.metrics.record_failure(&e);
                warn!(
                    "[{}] Extraction from {} failed after {}: {}",
                    request.id,
                    request.page_url,
                    format_duration(duration),
                    e
                );
                Err(e)
            }
        }
    }

    async fn run_pipeline(
        &self,
        request: &ExtractionRequest,
    ) -> Result<(ResultSet, Strategy, Option<EscalationReason>), ExtractionError> {
        // A failed fetch is terminal; only a successful but empty parse escalates.
        let html = self.fetcher.fetch(&request.page_url).await?;
        let static_images = extract_static(&html, &request.page_url);
        debug!(
            "[{}] Static pass found {} images",
            request.id,
            static_images.len()
        );

        let reason = match (request.mode, static_images.is_empty()) {
            (ExtractionMode::Auto, false) => return Ok((static_images, Strategy::Static, None)),
            (ExtractionMode::ForceDynamic, _) => EscalationReason::Requested,
            (ExtractionMode::Auto, true) => EscalationReason::EmptyStaticResult,
        };

        info!("[{}] Escalating to browser render ({:?})", request.id, reason);
        self.metrics.record_escalation();

        let dynamic_images = self.dynamic.extract(&request.page_url).await?;
        Ok((dynamic_images, Strategy::Dynamic, Some(reason)))
    }
}
