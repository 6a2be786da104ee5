//! Configuration management with serde serialization/deserialization
//!
//! This module provides the configuration structures for the image extractor,
//! the per-request types that flow through the extraction pipeline, and the
//! Chrome launch settings used by the dynamic pass.

use crate::{validate_url, ExtractionError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main configuration structure for the image extractor
///
/// Controls the static fetch, the headless-browser pass and the HTTP server.
/// Every field has a default, so a configuration file only needs to list the
/// values it changes.
///
/// # Examples
///
/// ```rust
/// use image_extractor::Config;
/// use std::time::Duration;
///
/// // Use default configuration
/// let config = Config::default();
///
/// // Tighter timeouts for a latency-sensitive deployment
/// let config = Config {
///     fetch_timeout: Duration::from_secs(5),
///     navigation_timeout: Duration::from_secs(10),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Timeout for the initial page GET (default: 30 seconds)
    pub fetch_timeout: Duration,

    /// Upper bound for navigation plus the network-idle wait (default: 30 seconds)
    ///
    /// Pages that never go quiet fail with a timeout instead of hanging the request.
    pub navigation_timeout: Duration,

    /// How long the network must stay quiet before the page counts as loaded
    /// (default: 500ms)
    pub network_idle_window: Duration,

    /// Auto-scroll protocol used to trigger lazy-loaded images
    pub scroll: ScrollSettings,

    /// Browser viewport used by the dynamic pass
    pub viewport: Viewport,

    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    /// Custom User-Agent for both the page fetch and the browser (default: client default)
    pub user_agent: Option<String>,

    /// Disable Content-Security-Policy on rendered pages (default: true)
    ///
    /// Strict CSP headers can otherwise block the injected collection script.
    pub bypass_csp: bool,

    /// HTTP server settings for `serve`
    pub server: ServerSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(30),
            network_idle_window: Duration::from_millis(500),
            scroll: ScrollSettings::default(),
            viewport: Viewport::default(),
            chrome_path: None,
            user_agent: None,
            bypass_csp: true,
            server: ServerSettings::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.fetch_timeout.is_zero() {
            return Err(ExtractionError::ConfigurationError(
                "Fetch timeout must be greater than 0".to_string(),
            ));
        }

        if self.navigation_timeout.is_zero() {
            return Err(ExtractionError::ConfigurationError(
                "Navigation timeout must be greater than 0".to_string(),
            ));
        }

        if self.scroll.step_px == 0 {
            return Err(ExtractionError::ConfigurationError(
                "Scroll step must be greater than 0".to_string(),
            ));
        }

        if self.scroll.max_steps == 0 {
            return Err(ExtractionError::ConfigurationError(
                "Max scroll steps must be greater than 0".to_string(),
            ));
        }

        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ExtractionError::ConfigurationError(
                "Viewport dimensions must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Auto-scroll protocol settings
///
/// The page is scrolled down by `step_px` every `delay` until the scroll
/// position reaches the document height, then returned to the top.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrollSettings {
    /// Pixels per scroll step (default: 600)
    pub step_px: u32,

    /// Pause between steps so lazy-load listeners can fire (default: 60ms)
    pub delay: Duration,

    /// Hard cap on steps for pages whose height keeps growing (default: 500)
    pub max_steps: usize,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            step_px: 600,
            delay: Duration::from_millis(60),
            max_steps: 500,
        }
    }
}

/// Browser viewport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Viewport {
    /// Viewport width in pixels (default: 1920)
    pub width: u32,

    /// Viewport height in pixels (default: 1080)
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Whether the coordinator may stop after the static pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum ExtractionMode {
    /// Static pass first, browser only when it finds nothing
    #[default]
    Auto,
    /// Always render in the browser and return its result
    ForceDynamic,
}

impl ExtractionMode {
    pub fn from_dynamic_flag(dynamic: bool) -> Self {
        if dynamic {
            Self::ForceDynamic
        } else {
            Self::Auto
        }
    }
}

/// A validated extraction request
///
/// Construction is the only validation point: a request that exists always
/// carries an absolute `http(s)` page URL.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub id: String,
    pub page_url: Url,
    pub mode: ExtractionMode,
}

impl ExtractionRequest {
    pub fn new(page_url: &str, mode: ExtractionMode) -> Result<Self, ExtractionError> {
        let trimmed = page_url.trim();
        if trimmed.is_empty() {
            return Err(ExtractionError::InvalidInput("Missing URL".to_string()));
        }

        let page_url = validate_url(trimmed)?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            page_url,
            mode,
        })
    }
}

/// Generate Chrome command-line arguments based on configuration
///
/// # Examples
///
/// ```rust
/// use image_extractor::{Config, get_chrome_args};
///
/// let config = Config::default();
/// let args = get_chrome_args(&config);
/// assert!(args.contains(&"--no-sandbox".to_string()));
/// ```
pub fn get_chrome_args(config: &Config) -> Vec<String> {
    let mut args = vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--mute-audio".to_string(),
        "--hide-scrollbars".to_string(),
        "--disable-features=TranslateUI".to_string(),
        format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        ),
    ];

    if let Some(user_agent) = &config.user_agent {
        args.push(format!("--user-agent={user_agent}"));
    }

    args
}

/// Build the chromiumoxide launch configuration for one browser session
///
/// Each session gets its own profile directory so concurrent requests never
/// share Chrome's singleton lock.
pub fn create_browser_config(
    config: &Config,
    profile_dir: &Path,
) -> Result<chromiumoxide::browser::BrowserConfig, ExtractionError> {
    use chromiumoxide::browser::BrowserConfig;

    let mut builder = BrowserConfig::builder()
        .window_size(config.viewport.width, config.viewport.height)
        .user_data_dir(profile_dir)
        .args(get_chrome_args(config));

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder
        .build()
        .map_err(ExtractionError::ConfigurationError)
}
