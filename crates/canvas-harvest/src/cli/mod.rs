//! CLI subcommand implementations for the canvas-harvest binary.

pub mod courses_cmd;
pub mod doctor;
pub mod harvest_cmd;
pub mod output;

use crate::config::HarvestConfig;
use crate::error::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Command-line overrides for values otherwise read from the environment.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// Portal entry URL (overrides CANVAS_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Directory downloads are saved into (overrides CANVAS_DOWNLOAD_DIR)
    #[arg(long, global = true)]
    pub download_dir: Option<PathBuf>,
    /// Run the browser without a window
    #[arg(long, global = true)]
    pub headless: bool,
    /// Element wait timeout in milliseconds (overrides CANVAS_WAIT_MS)
    #[arg(long, global = true)]
    pub wait_ms: Option<u64>,
    /// Maximum module pages walked per course (overrides CANVAS_MAX_PAGES)
    #[arg(long, global = true)]
    pub max_pages: Option<usize>,
}

impl Overrides {
    /// Environment configuration with these overrides applied on top.
    pub fn resolve(&self) -> Result<HarvestConfig> {
        Ok(self.apply(HarvestConfig::from_env()?))
    }

    pub fn apply(&self, mut config: HarvestConfig) -> HarvestConfig {
        if let Some(url) = &self.base_url {
            config.base_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        if self.headless {
            config.headless = true;
        }
        if let Some(ms) = self.wait_ms {
            config.wait_timeout = Duration::from_millis(ms);
        }
        if let Some(pages) = self.max_pages {
            config.max_pages = pages;
        }
        config
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise the level follows the CLI flags.
pub fn init_tracing(verbose: bool, quiet: bool, json: bool) {
    let default = if verbose {
        "canvas_harvest=debug"
    } else if quiet {
        "canvas_harvest=warn"
    } else {
        "canvas_harvest=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.with_ansi(output::use_color()).init();
    }
}
