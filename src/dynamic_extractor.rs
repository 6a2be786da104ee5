//! Browser-rendered image discovery
//!
//! Drives one [`BrowserSession`] through
//! `Launching → Navigating → Scrolling → Collecting → Closing → Done | Failed`.
//! Once a session exists, `Closing` runs on every exit path before the
//! result or error is handed back.

use crate::{BrowserLauncher, BrowserSession, Config, ExtractionError, ResultSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};
use url::Url;

/// Phase of a single dynamic extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPhase {
    Launching,
    Navigating,
    Scrolling,
    Collecting,
    Closing,
    Done,
    Failed,
}

impl fmt::Display for ExtractionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionPhase::Launching => "launching",
            ExtractionPhase::Navigating => "navigating",
            ExtractionPhase::Scrolling => "scrolling",
            ExtractionPhase::Collecting => "collecting",
            ExtractionPhase::Closing => "closing",
            ExtractionPhase::Done => "done",
            ExtractionPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tunables for the rendering protocol.
#[derive(Debug, Clone)]
pub struct DynamicSettings {
    pub navigation_timeout: Duration,
    pub network_idle_window: Duration,
    pub scroll_step: u64,
    pub scroll_delay: Duration,
    pub max_scroll_steps: usize,
}

impl From<&Config> for DynamicSettings {
    fn from(config: &Config) -> Self {
        Self {
            navigation_timeout: config.navigation_timeout,
            network_idle_window: config.network_idle_window,
            scroll_step: u64::from(config.scroll.step_px),
            scroll_delay: config.scroll.delay,
            max_scroll_steps: config.scroll.max_steps,
        }
    }
}

/// Phase bookkeeping for one extraction; every transition goes through here.
struct PhaseTrace<'a> {
    page_url: &'a Url,
    history: Vec<ExtractionPhase>,
}

impl<'a> PhaseTrace<'a> {
    fn new(page_url: &'a Url) -> Self {
        debug!("Dynamic extraction of {}: {}", page_url, ExtractionPhase::Launching);
        Self {
            page_url,
            history: vec![ExtractionPhase::Launching],
        }
    }

    fn current(&self) -> ExtractionPhase {
        self.history
            .last()
            .copied()
            .unwrap_or(ExtractionPhase::Launching)
    }

    fn enter(&mut self, next: ExtractionPhase) {
        debug!(
            "Dynamic extraction of {}: {} -> {}",
            self.page_url,
            self.current(),
            next
        );
        self.history.push(next);
    }

    fn fail(&mut self, error: &ExtractionError) {
        self.fail_in(self.current(), error);
    }

    fn fail_in(&mut self, phase: ExtractionPhase, error: &ExtractionError) {
        warn!(
            "Dynamic extraction of {} failed while {}: {}",
            self.page_url, phase, error
        );
        self.history.push(ExtractionPhase::Failed);
    }
}

pub struct DynamicExtractor {
    launcher: Arc<dyn BrowserLauncher>,
    settings: DynamicSettings,
}

impl DynamicExtractor {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settings: DynamicSettings) -> Self {
        Self { launcher, settings }
    }

    pub async fn extract(&self, page_url: &Url) -> Result<ResultSet, ExtractionError> {
        let mut phases = PhaseTrace::new(page_url);
        self.extract_traced(page_url, &mut phases).await
    }

    async fn extract_traced(
        &self,
        page_url: &Url,
        phases: &mut PhaseTrace<'_>,
    ) -> Result<ResultSet, ExtractionError> {
        let mut session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                phases.fail(&e);
                return Err(e);
            }
        };

        let outcome = self.run(session.as_mut(), page_url, phases).await;
        let failed_in = phases.current();

        phases.enter(ExtractionPhase::Closing);
        if let Err(e) = session.close().await {
            warn!("Browser session for {} did not close cleanly: {}", page_url, e);
        }

        match outcome {
            Ok(candidates) => {
                let images = ResultSet::from_candidates(page_url, candidates);
                phases.enter(ExtractionPhase::Done);
                Ok(images)
            }
            Err(e) => {
                phases.fail_in(failed_in, &e);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        session: &mut dyn BrowserSession,
        page_url: &Url,
        phases: &mut PhaseTrace<'_>,
    ) -> Result<Vec<String>, ExtractionError> {
        session.open_page().await?;

        phases.enter(ExtractionPhase::Navigating);
        let navigation = async {
            session.navigate(page_url.as_str()).await?;
            session
                .wait_for_network_idle(self.settings.network_idle_window)
                .await
        };
        timeout(self.settings.navigation_timeout, navigation)
            .await
            .map_err(|_| ExtractionError::Timeout(self.settings.navigation_timeout))??;

        phases.enter(ExtractionPhase::Scrolling);
        let steps = self.auto_scroll(session).await?;
        debug!("Scrolled {} in {} steps", page_url, steps);

        phases.enter(ExtractionPhase::Collecting);
        let candidates: Vec<String> = session
            .collect_image_candidates()
            .await?
            .into_iter()
            .filter(|candidate| !candidate.trim().is_empty())
            .collect();

        info!("Collected {} image candidates from rendered {}", candidates.len(), page_url);
        Ok(candidates)
    }

    /// Step down the page until the position passes the document height,
    /// then return to the top. Returns the number of downward steps.
    async fn auto_scroll(&self, session: &mut dyn BrowserSession) -> Result<usize, ExtractionError> {
        let mut y = 0u64;
        let mut steps = 0usize;

        loop {
            y += self.settings.scroll_step;
            session.scroll_to(y).await?;
            steps += 1;

            let height = session.scroll_height().await?;
            if y >= height {
                break;
            }
            if steps >= self.settings.max_scroll_steps {
                warn!("Stopped auto-scroll after {} steps at y={} (height {})", steps, y, height);
                break;
            }

            sleep(self.settings.scroll_delay).await;
        }

        session.scroll_to(0).await?;
        Ok(steps)
    }
}
