//! Diagnostic logging: append-only file under the XDG state dir, or stderr.
//!
//! This is the developer-facing trace of a run. The per-download CSV the user asks
//! for with `--log` lives in [`crate::download_log`].

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const FILE_FILTER: &str = "info,geturls=debug,geturls_core=debug";
const STDERR_FILTER: &str = "warn";

/// Path of the diagnostic log: `~/.local/state/geturls/geturls.log`.
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("geturls")?;
    Ok(xdg_dirs.get_state_home().join("geturls").join("geturls.log"))
}

/// `RUST_LOG` when set and valid, `default` otherwise.
fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Open `path` for appending, creating it and its parent directory.
fn open_append(path: &Path) -> io::Result<fs::File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::OpenOptions::new().create(true).append(true).open(path)
}

/// Send tracing output to the state-dir log file and return its path.
///
/// Returns Err when the file cannot be opened so the caller can fall back to
/// [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let path = log_path()?;
    let file = open_append(&path).with_context(|| format!("open log {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter_or(FILE_FILTER))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!(log = %path.display(), "geturls starting");
    Ok(path)
}

/// Stderr-only logging, warnings and up unless `RUST_LOG` says otherwise, so the
/// progress display stays readable.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(filter_or(STDERR_FILTER))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
