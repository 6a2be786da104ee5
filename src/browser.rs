//! Headless browser sessions for the dynamic pass
//!
//! A session is one Chrome process with one page, created for a single
//! extraction and torn down before that extraction returns. Nothing here is
//! pooled or shared between requests.
//!
//! The protocol logic lives in [`crate::DynamicExtractor`] and only talks to
//! the [`BrowserLauncher`] / [`BrowserSession`] traits, so it can run against
//! a fake session in tests.

use crate::{create_browser_config, Config, ExtractionError};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::page::SetBypassCspParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Collects image references from the rendered DOM.
///
/// For `<img>`: `currentSrc`, then `src`, then `data-src`. For every
/// `<source srcset>`: the URL part of each candidate. Returns a
/// duplicate-free array of non-empty strings in encounter order.
pub const COLLECT_IMAGES_JS: &str = r#"(() => {
    const urls = new Set();
    document.querySelectorAll('img').forEach((img) => {
        urls.add(img.currentSrc || img.src || img.dataset.src || '');
    });
    document.querySelectorAll('source[srcset]').forEach((source) => {
        source.srcset.split(',').forEach((candidate) => {
            const [url] = candidate.trim().split(/\s+/);
            if (url) urls.add(url);
        });
    });
    return Array.from(urls).filter(Boolean);
})()"#;

const SCROLL_HEIGHT_JS: &str = r#"(() => {
    const body = document.body;
    const root = document.documentElement;
    return Math.max(body ? body.scrollHeight : 0, root ? root.scrollHeight : 0);
})()"#;

const NETWORK_ACTIVITY_JS: &str =
    "[document.readyState, performance.getEntriesByType('resource').length]";

const NETWORK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Starts browser sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ExtractionError>;
}

/// One browser process with (at most) one page.
#[async_trait]
pub trait BrowserSession: Send {
    async fn open_page(&mut self) -> Result<(), ExtractionError>;

    async fn navigate(&mut self, url: &str) -> Result<(), ExtractionError>;

    /// Resolve once the network has been quiet for `idle_window`.
    ///
    /// Has no deadline of its own; callers bound it with a timeout.
    async fn wait_for_network_idle(&mut self, idle_window: Duration) -> Result<(), ExtractionError>;

    async fn scroll_height(&mut self) -> Result<u64, ExtractionError>;

    async fn scroll_to(&mut self, y: u64) -> Result<(), ExtractionError>;

    /// Raw, unresolved image references found in the rendered page.
    async fn collect_image_candidates(&mut self) -> Result<Vec<String>, ExtractionError>;

    /// Release every resource held by the session. Safe to call twice.
    async fn close(&mut self) -> Result<(), ExtractionError>;
}

pub struct ChromiumLauncher {
    config: Config,
}

impl ChromiumLauncher {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ExtractionError> {
        let profile_dir =
            std::env::temp_dir().join(format!("image-extractor-{}", uuid::Uuid::new_v4()));

        tokio::fs::create_dir_all(&profile_dir).await.map_err(|e| {
            ExtractionError::BrowserLaunchFailed(format!("Failed to create profile dir: {e}"))
        })?;

        let launched = match create_browser_config(&self.config, &profile_dir) {
            Ok(browser_config) => Browser::launch(browser_config)
                .await
                .map_err(|e| ExtractionError::BrowserLaunchFailed(e.to_string())),
            Err(e) => Err(e),
        };

        let (browser, mut handler) = match launched {
            Ok(pair) => pair,
            Err(e) => {
                remove_profile_dir(&profile_dir).await;
                return Err(e);
            }
        };

        // The handler drives the CDP connection and must be polled for the
        // browser to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {}", e);
                }
            }
        });

        info!("Launched headless browser (profile {})", profile_dir.display());

        Ok(Box::new(ChromiumSession {
            browser: Some(browser),
            page: None,
            handler: Some(handler_task),
            profile_dir: Some(profile_dir),
            bypass_csp: self.config.bypass_csp,
        }))
    }
}

pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    profile_dir: Option<PathBuf>,
    bypass_csp: bool,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, ExtractionError> {
        self.page
            .as_ref()
            .ok_or_else(|| ExtractionError::ScriptFailed("no page is open".to_string()))
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, ExtractionError> {
        self.page()?
            .evaluate(script)
            .await
            .map_err(|e| ExtractionError::ScriptFailed(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| ExtractionError::ScriptFailed(format!("unexpected script result: {e}")))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn open_page(&mut self) -> Result<(), ExtractionError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ExtractionError::BrowserLaunchFailed("browser is closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ExtractionError::BrowserLaunchFailed(e.to_string()))?;

        if self.bypass_csp {
            page.execute(SetBypassCspParams::new(true))
                .await
                .map_err(|e| ExtractionError::BrowserLaunchFailed(e.to_string()))?;
        }

        self.page = Some(page);
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), ExtractionError> {
        self.page()?
            .goto(url)
            .await
            .map_err(|e| ExtractionError::NavigationFailed(format!("{url}: {e}")))?;
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, idle_window: Duration) -> Result<(), ExtractionError> {
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        loop {
            let (ready_state, resource_count): (String, u64) =
                self.eval(NETWORK_ACTIVITY_JS).await?;

            if ready_state == "complete" && last_count == Some(resource_count) {
                if quiet_since.elapsed() >= idle_window {
                    debug!("Network idle after {} resources", resource_count);
                    return Ok(());
                }
            } else {
                last_count = Some(resource_count);
                quiet_since = Instant::now();
            }

            sleep(NETWORK_POLL_INTERVAL).await;
        }
    }

    async fn scroll_height(&mut self) -> Result<u64, ExtractionError> {
        let height: f64 = self.eval(SCROLL_HEIGHT_JS).await?;
        Ok(height.max(0.0) as u64)
    }

    async fn scroll_to(&mut self, y: u64) -> Result<(), ExtractionError> {
        self.page()?
            .evaluate(format!("window.scrollTo(0, {y})"))
            .await
            .map_err(|e| ExtractionError::ScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn collect_image_candidates(&mut self) -> Result<Vec<String>, ExtractionError> {
        self.eval(COLLECT_IMAGES_JS).await
    }

    async fn close(&mut self) -> Result<(), ExtractionError> {
        let mut first_error = None;

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Page close failed: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser close failed: {}", e);
                first_error.get_or_insert(ExtractionError::BrowserCloseFailed(e.to_string()));
            }
            if let Err(e) = browser.wait().await {
                warn!("Waiting for browser exit failed: {}", e);
                first_error.get_or_insert(ExtractionError::BrowserCloseFailed(e.to_string()));
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        if let Some(profile_dir) = self.profile_dir.take() {
            remove_profile_dir(&profile_dir).await;
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// Covers sessions dropped mid-extraction, e.g. when the caller's future is cancelled.
impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        if let Some(profile_dir) = self.profile_dir.take() {
            warn!("Browser session dropped without close; removing {}", profile_dir.display());
            if let Err(e) = std::fs::remove_dir_all(&profile_dir) {
                debug!("Could not remove profile dir {}: {}", profile_dir.display(), e);
            }
        }
    }
}

async fn remove_profile_dir(profile_dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(profile_dir).await {
        debug!("Could not remove profile dir {}: {}", profile_dir.display(), e);
    }
}
