//! CLI for geturls: find URLs, download them, sort the results.

mod commands;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use geturls_core::config;
use geturls_core::placement::PlacementPolicy;
use geturls_core::progress::Verbosity;
use std::path::PathBuf;

use commands::{collect_urls, print_urls, run_download};

/// Downloads and sorts URLs parsed from files or given on the command line.
#[derive(Debug, Parser)]
#[command(name = "geturls")]
#[command(about = "Download and sort URLs parsed from file(s)", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "urls"])))]
#[command(group(ArgGroup::new("sort").args(["hostsort", "namesort", "typesort"])))]
pub struct Cli {
    /// Input file(s) to parse for URLs.
    #[arg(short, long, num_args = 1.., value_name = "FILE")]
    pub input: Vec<PathBuf>,

    /// URL(s) to download, given as text.
    #[arg(short, long, num_args = 1.., value_name = "URL")]
    pub urls: Vec<String>,

    /// Root directory for all files and subdirectories (defaults to the current directory).
    #[arg(short, long, value_name = "DIR")]
    pub dirprefix: Option<PathBuf>,

    /// Create subdirectories from each URL's host and path.
    #[arg(long)]
    pub hostsort: bool,

    /// Create subdirectories from similar filenames.
    #[arg(long)]
    pub namesort: bool,

    /// Create subdirectories from file types.
    #[arg(long)]
    pub typesort: bool,

    /// Print the URLs found and exit without downloading.
    #[arg(short = 'x', long)]
    pub extract: bool,

    /// Overwrite existing files of the same name (once per name per run).
    #[arg(long)]
    pub overwrite: bool,

    /// Skip URLs ending in these file types (e.g. `jpg` or `.jpg`).
    #[arg(short, long, num_args = 1.., value_name = "EXT")]
    pub reject: Vec<String>,

    /// Seconds to wait between URL requests (config `wait_secs`, default 0.01).
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_wait)]
    pub wait: Option<f64>,

    /// Minimal status display.
    #[arg(short, long)]
    pub quiet: bool,

    /// Print nothing to stdout.
    #[arg(short, long)]
    pub silent: bool,

    /// Append a CSV record of each placed file to this log.
    #[arg(short, long, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        Cli::parse().run()
    }

    pub fn run(&self) -> Result<()> {
        let urls = collect_urls(self)?;
        tracing::debug!(count = urls.len(), "urls collected");

        if self.extract {
            print_urls(&urls);
            return Ok(());
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        run_download(self, &cfg, &urls)
    }

    pub fn policy(&self) -> PlacementPolicy {
        if self.hostsort {
            PlacementPolicy::ByHost
        } else if self.namesort {
            PlacementPolicy::ByName
        } else if self.typesort {
            PlacementPolicy::ByType
        } else {
            PlacementPolicy::Flat
        }
    }

    /// Silent wins over quiet.
    pub fn verbosity(&self) -> Verbosity {
        if self.silent {
            Verbosity::Silent
        } else if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }
}

fn parse_wait(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("`{}` must be zero or more seconds", s));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests;
