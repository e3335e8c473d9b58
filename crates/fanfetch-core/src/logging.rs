//! `tracing` setup for the `fanfetch` binary.
//!
//! Events go to `$XDG_STATE_HOME/fanfetch/fanfetch.log`. Worker threads log
//! concurrently, so every event gets its own handle to the file and carries
//! the thread name (`fanfetch-worker-N`, `fanfetch-pool-N`).

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,fanfetch=debug,fanfetch_core=debug";

/// Destination of one event: the run log, or stderr if the log handle could
/// not be duplicated.
enum Sink {
    Log(File),
    Stderr,
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Log(f) => f.write(buf),
            Sink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Log(f) => f.flush(),
            Sink::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct RunLog(File);

impl<'a> MakeWriter<'a> for RunLog {
    type Writer = Sink;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => Sink::Log(f),
            Err(_) => Sink::Stderr,
        }
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `~/.local/state/fanfetch/fanfetch.log` unless `XDG_STATE_HOME` says otherwise.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fanfetch")?;
    Ok(xdg_dirs.get_state_home().join("fanfetch").join("fanfetch.log"))
}

/// Install the global subscriber writing to the run log.
///
/// Fails if the state directory or the log file cannot be opened, or if a
/// subscriber is already installed; the caller then uses
/// [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(BoxMakeWriter::new(RunLog(file)))
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    tracing::info!("logging to {}", path.display());
    Ok(())
}

/// Install a stderr-only subscriber. A no-op if one is already installed.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_thread_names(true)
        .try_init();
}
