use crate::{install_prometheus_recorder, serve, AppState, Config, ExtractionService};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "image-extractor")]
#[command(about = "Extract image URLs from static and JavaScript-rendered pages")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, help = "Configuration file path (JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Page fetch and navigation timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, help = "Chrome executable path")]
    pub chrome_path: Option<String>,

    #[arg(long, help = "User-Agent for page fetches and the browser")]
    pub user_agent: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract image URLs from a single page
    Extract {
        #[arg(short, long, help = "Page URL")]
        url: String,

        #[arg(long, help = "Always render the page in a headless browser")]
        dynamic: bool,

        #[arg(short, long, help = "Write the JSON result to this file instead of stdout")]
        output: Option<PathBuf>,
    },

    /// Start the HTTP API
    Serve {
        #[arg(short, long, help = "Server port")]
        port: Option<u16>,

        #[arg(long, help = "Bind address")]
        bind: Option<String>,

        #[arg(long, help = "Expose Prometheus metrics on /metrics")]
        metrics: bool,
    },

    /// Validate configuration
    Validate {
        #[arg(short, long, help = "Configuration file to validate")]
        config: PathBuf,
    },
}

pub struct CliRunner {
    pub config: Config,
    pub service: Arc<ExtractionService>,
}

impl CliRunner {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let service = Arc::new(ExtractionService::new(config.clone())?);
        Ok(Self { config, service })
    }

    /// Run `command`, stopping early once `shutdown` resolves.
    pub async fn run(
        &self,
        command: Commands,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        match command {
            Commands::Extract {
                url,
                dynamic,
                output,
            } => {
                tokio::select! {
                    result = self.run_extract(&url, dynamic, output.as_deref()) => result,
                    _ = shutdown => {
                        warn!("Extraction of {} interrupted", url);
                        Ok(())
                    }
                }
            }
            Commands::Serve {
                port,
                bind,
                metrics,
            } => self.run_server(port, bind, metrics, shutdown).await,
            Commands::Validate { config } => validate_config_file(&config).await,
        }
    }

    pub async fn run_extract(
        &self,
        url: &str,
        dynamic: bool,
        output: Option<&Path>,
    ) -> anyhow::Result<()> {
        let outcome = self.service.extract_url(url, dynamic).await?;
        let json = serde_json::to_string_pretty(&outcome.images)?;

        match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).await?;
                }
                fs::write(path, json.as_bytes()).await?;
                info!("Wrote {} image URLs to {}", outcome.images.len(), path.display());
            }
            None => println!("{json}"),
        }

        Ok(())
    }

    pub async fn run_server(
        &self,
        port: Option<u16>,
        bind: Option<String>,
        metrics: bool,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let bind = bind.unwrap_or_else(|| self.config.server.bind.clone());
        let port = port.unwrap_or(self.config.server.port);
        let addr: SocketAddr = format!("{bind}:{port}").parse()?;

        let metrics = if metrics {
            Some(install_prometheus_recorder()?)
        } else {
            None
        };

        let state = AppState {
            service: self.service.clone(),
            metrics,
        };

        serve(addr, state, shutdown).await
    }
}

pub async fn validate_config_file(config_path: &Path) -> anyhow::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config_content = fs::read_to_string(config_path).await?;
    let config: Config = serde_json::from_str(&config_content)?;
    config.validate()?;

    println!("Configuration is valid:");
    println!("  Fetch timeout: {:?}", config.fetch_timeout);
    println!("  Navigation timeout: {:?}", config.navigation_timeout);
    println!("  Network idle window: {:?}", config.network_idle_window);
    println!(
        "  Scroll: {}px every {:?} (max {} steps)",
        config.scroll.step_px, config.scroll.delay, config.scroll.max_steps
    );
    println!(
        "  Viewport: {}x{}",
        config.viewport.width, config.viewport.height
    );

    Ok(())
}

pub fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // stdout carries extraction results, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
