use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::RunError;
use crate::partition::MAX_RESOURCE_ID;

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_MAX_RESOURCE_ID: u64 = 100;
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/photos";

/// HTTP transfer settings (optional `[http]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Seconds allowed for establishing the connection.
    pub connect_timeout_secs: u64,
    /// Seconds allowed for a whole request.
    pub timeout_secs: u64,
    /// Follow 3xx redirects; when false the redirect status itself is counted.
    pub follow_redirects: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 30,
            follow_redirects: true,
        }
    }
}

/// Execution backend: one thread per batch, a bounded pool over single-id
/// tasks, or everything on the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Threads,
    Pool,
    Sequential,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Threads => "threads",
            Backend::Pool => "pool",
            Backend::Sequential => "sequential",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "threads" => Ok(Backend::Threads),
            "pool" => Ok(Backend::Pool),
            "sequential" => Ok(Backend::Sequential),
            other => Err(format!(
                "unknown backend {:?} (expected threads, pool or sequential)",
                other
            )),
        }
    }
}

/// Configuration loaded from `~/.config/fanfetch/config.toml`.
/// Every field is optional in the file; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanfetchConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Inclusive upper bound of the resource ids to fetch.
    pub max_resource_id: u64,
    /// Base URL; each request goes to `{base_url}/{id}`.
    pub base_url: String,
    pub backend: Option<Backend>,
    pub http: Option<HttpConfig>,
}

impl Default for FanfetchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_resource_id: DEFAULT_MAX_RESOURCE_ID,
            base_url: DEFAULT_BASE_URL.to_string(),
            backend: None,
            http: None,
        }
    }
}

impl FanfetchConfig {
    /// Validated run parameters from this file's values.
    pub fn run_config(&self) -> Result<RunConfig, RunError> {
        RunConfig::new(self.workers, self.max_resource_id, &self.base_url)
    }

    pub fn http_or_default(&self) -> HttpConfig {
        self.http.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fanfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FanfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FanfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<FanfetchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: FanfetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

/// Validated, immutable parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    workers: usize,
    max_resource_id: u64,
    base_url: String,
}

impl RunConfig {
    /// Checks that `workers` is at least 1, that `max_resource_id` lies in
    /// `1..=MAX_RESOURCE_ID` and that `base_url` is an absolute http(s) URL.
    /// A trailing `/` is dropped so resource URLs never contain `//`.
    pub fn new(workers: usize, max_resource_id: u64, base_url: &str) -> Result<Self, RunError> {
        if workers == 0 {
            return Err(RunError::invalid("worker count must be at least 1"));
        }
        if max_resource_id == 0 {
            return Err(RunError::invalid("max resource id must be at least 1"));
        }
        if max_resource_id > MAX_RESOURCE_ID {
            return Err(RunError::invalid(format!(
                "max resource id must be at most {}",
                MAX_RESOURCE_ID
            )));
        }
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(RunError::invalid("base url must not be empty"));
        }
        let parsed = url::Url::parse(base_url)
            .map_err(|e| RunError::invalid(format!("invalid base url {:?}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RunError::invalid(format!(
                "base url {:?} must use http or https",
                base_url
            )));
        }

        Ok(Self {
            workers,
            max_resource_id,
            base_url: base_url.to_string(),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn max_resource_id(&self) -> u64 {
        self.max_resource_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}/{id}`.
    pub fn resource_url(&self, id: u64) -> String {
        format!("{}/{}", self.base_url, id)
    }
}
