//! CLI for the fanfetch harness.

mod report;

use anyhow::{Context, Result};
use clap::Parser;
use fanfetch_core::config::{self, FanfetchConfig};
use fanfetch_core::{Backend, CurlFetcher, CurlOptions, Executor, RunConfig};
use std::path::PathBuf;

/// Fetch `{url}/{id}` for every id in `[1, resourceid]` across concurrent
/// workers and count the response status codes.
#[derive(Debug, Parser)]
#[command(name = "fanfetch")]
#[command(about = "fanfetch: concurrent HTTP-fetch harness", long_about = None)]
pub struct Cli {
    /// Number of workers used for the run (default 5).
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// The max resource id; ids 1..=ID are fetched (default 100).
    #[arg(short = 'r', long = "resourceid", value_name = "ID")]
    pub resource_id: Option<u64>,

    /// The base URL used to fetch resources.
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,

    /// Execution backend: threads, pool or sequential (default threads).
    #[arg(short, long, value_name = "BACKEND")]
    pub backend: Option<Backend>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Read settings from this file instead of ~/.config/fanfetch/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        Cli::parse().execute().await
    }

    pub async fn execute(self) -> Result<()> {
        let file_cfg = self.load_config()?;
        tracing::debug!("loaded config: {:?}", file_cfg);

        let run = self.run_config(&file_cfg)?;
        let backend = self.backend(&file_cfg);
        let fetcher = CurlFetcher::new(CurlOptions::from(&file_cfg.http_or_default()));
        let opts = *fetcher.options();
        let executor = Executor::new(fetcher).with_backend(backend);

        tracing::info!("Starting fanfetch with the following options . . .");
        tracing::info!("workers = {}", run.workers());
        tracing::info!("resourceid = {}", run.max_resource_id());
        tracing::info!("url = {}", run.base_url());
        tracing::info!("backend = {}", executor.backend());
        tracing::info!(
            "timeouts = connect {:?}, total {:?}",
            opts.connect_timeout,
            opts.timeout
        );

        let report = tokio::task::spawn_blocking(move || executor.run(&run))
            .await
            .context("executor task join")??;

        report::log(&report);
        if self.json {
            println!("{}", report::render_json(&report)?);
        } else {
            print!("{}", report::render_text(&report));
        }
        Ok(())
    }

    /// Explicit `--config` must load; the default XDG file falls back to
    /// built-in defaults when it can't be created or read.
    fn load_config(&self) -> Result<FanfetchConfig> {
        match &self.config {
            Some(path) => config::load_from_path(path),
            None => Ok(config::load_or_init().unwrap_or_else(|e| {
                tracing::warn!("using built-in defaults, config unavailable: {:#}", e);
                FanfetchConfig::default()
            })),
        }
    }

    /// Flags override the config file, which overrides built-in defaults.
    fn run_config(&self, file_cfg: &FanfetchConfig) -> Result<RunConfig> {
        let workers = self.workers.unwrap_or(file_cfg.workers);
        let max_resource_id = self.resource_id.unwrap_or(file_cfg.max_resource_id);
        let base_url = self.url.as_deref().unwrap_or(&file_cfg.base_url);
        Ok(RunConfig::new(workers, max_resource_id, base_url)?)
    }

    fn backend(&self, file_cfg: &FanfetchConfig) -> Backend {
        self.backend.or(file_cfg.backend).unwrap_or_default()
    }
}
