//! # Image Extractor
//!
//! Finds every image a web page references and returns them as absolute
//! `http(s)` URLs. Works on plain server-rendered HTML and on pages that only
//! materialize their images through client-side JavaScript (lazy-loading,
//! infinite scroll, `<picture>`/`srcset` responsive images).
//!
//! ## Pipeline
//!
//! Each request runs through two tiers:
//!
//! | Tier | Cost | Sees |
//! |------|------|------|
//! | **Static** | one GET + HTML parse | `<img src>`, `<img data-src>`, first `srcset` candidate |
//! | **Dynamic** | headless Chrome session | everything the rendered DOM holds after auto-scroll, all `srcset` candidates |
//!
//! The static pass always runs. The browser is only launched when the static
//! pass finds nothing or the caller explicitly asks for a render. A failed
//! page fetch is terminal and never escalates.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use image_extractor::{Config, ExtractionService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ExtractionService::new(Config::default())?;
//!
//!     let outcome = service.extract_url("https://example.com", false).await?;
//!     println!("{} images via {:?}", outcome.images.len(), outcome.strategy);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ### One page
//! ```bash
//! image-extractor extract --url https://example.com --dynamic
//! ```
//!
//! ### HTTP API
//! ```bash
//! image-extractor serve --port 3000 --metrics
//! curl -X POST localhost:3000/api/scrape -H 'content-type: application/json' \
//!      -d '{"url": "https://example.com"}'
//! ```

/// Configuration, request types and Chrome launch settings
pub mod config;

/// Error types and error classification
pub mod error;

/// Page fetching for the static pass
pub mod fetcher;

/// Image discovery from raw HTML
pub mod static_extractor;

/// Headless browser session abstraction and Chrome implementation
pub mod browser;

/// Browser-rendered image discovery
pub mod dynamic_extractor;

/// Coordinator running the two-tier pipeline
pub mod extraction_service;

/// HTTP API
pub mod server;

/// Command-line interface implementation
pub mod cli;

/// Extraction metrics and Prometheus exporter
pub mod metrics;

/// URL normalization and result-set helpers
pub mod utils;


pub use browser::*;
pub use cli::*;
pub use config::*;
pub use dynamic_extractor::{DynamicExtractor, DynamicSettings, ExtractionPhase};
pub use error::*;
pub use extraction_service::*;
pub use fetcher::*;
pub use self::metrics::*;
pub use server::{router, serve, AppState, ScrapeBody};
pub use static_extractor::*;
pub use utils::*;
