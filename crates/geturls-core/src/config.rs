use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::rate::DEFAULT_WINDOW;

/// Fetcher tuning (optional `[fetch]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// First read size for every streamed download.
    pub initial_chunk_bytes: usize,
    /// Chunk size never shrinks below this.
    pub min_chunk_bytes: usize,
    /// Chunk size never grows beyond this.
    pub max_chunk_bytes: usize,
    /// Number of chunk reads between chunk-size re-evaluations.
    pub checkpoint_interval: u64,
    /// Samples kept by the rate tracker.
    pub rate_window: usize,
    /// Halve the chunk when rate / chunk drops below this.
    pub shrink_below: f64,
    /// Double the chunk when rate / chunk rises above this.
    pub grow_above: f64,
    pub connect_timeout_secs: u64,
    /// Abort when throughput stays under this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            initial_chunk_bytes: 1024,
            min_chunk_bytes: 64,
            max_chunk_bytes: 4 * 1024 * 1024,
            checkpoint_interval: 32,
            rate_window: DEFAULT_WINDOW,
            shrink_below: 0.33,
            grow_above: 2.0,
            connect_timeout_secs: 30,
            low_speed_limit_bytes: 1,
            low_speed_time_secs: 60,
        }
    }
}

/// Global configuration loaded from `~/.config/geturls/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeturlsConfig {
    /// Seconds to wait between URL requests (0 disables the delay).
    #[serde(default = "default_wait_secs")]
    pub wait_secs: f64,
    /// CSV download log appended to on every run, unless overridden on the command line.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub fetch: FetchConfig,
}

fn default_wait_secs() -> f64 {
    0.01
}

impl Default for GeturlsConfig {
    fn default() -> Self {
        Self {
            wait_secs: default_wait_secs(),
            log_file: None,
            fetch: FetchConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("geturls")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load the config at `path`; a missing file yields the defaults, written back to `path`.
pub fn load_or_init_at(path: &Path) -> Result<GeturlsConfig> {
    match fs::read_to_string(path) {
        Ok(data) => {
            toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let cfg = GeturlsConfig::default();
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(path, toml::to_string_pretty(&cfg)?)
                .with_context(|| format!("write default config {}", path.display()))?;
            tracing::info!(config = %path.display(), "wrote default config");
            Ok(cfg)
        }
        Err(e) => Err(e).with_context(|| format!("read config {}", path.display())),
    }
}

/// [`load_or_init_at`] on the XDG config path.
pub fn load_or_init() -> Result<GeturlsConfig> {
    load_or_init_at(&config_path()?)
}
