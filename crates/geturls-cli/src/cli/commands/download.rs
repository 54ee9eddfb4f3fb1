//! Default command: download, place, and report.

use anyhow::Result;
use geturls_core::config::GeturlsConfig;
use geturls_core::dirs::validate_directory;
use geturls_core::fetcher::Fetcher;
use geturls_core::pipeline::{self, RunOptions, RunSummary};
use geturls_core::progress::{self, format::center, Verbosity};
use std::time::Duration;

use crate::cli::Cli;

pub fn run_download(cli: &Cli, cfg: &GeturlsConfig, urls: &[String]) -> Result<()> {
    let dest_root = match &cli.dirprefix {
        Some(dir) => validate_directory(dir)?,
        None => std::env::current_dir()?,
    };
    let wait_secs = cli.wait.unwrap_or(cfg.wait_secs);
    let options = RunOptions {
        dest_root,
        policy: cli.policy(),
        overwrite: cli.overwrite,
        wait: Duration::try_from_secs_f64(wait_secs).unwrap_or(Duration::ZERO),
        log_file: cli.log.clone().or_else(|| cfg.log_file.clone()),
    };
    tracing::info!(
        urls = urls.len(),
        dest = %options.dest_root.display(),
        policy = ?options.policy,
        "starting run"
    );

    let verbosity = cli.verbosity();
    if verbosity != Verbosity::Silent {
        println!();
    }

    let mut fetcher = Fetcher::new(cfg.fetch.clone());
    let mut sink = progress::for_verbosity(verbosity, urls.len());
    let summary = pipeline::run(urls, &options, &mut fetcher, sink.as_mut())?;

    print_summary(&summary, verbosity);
    Ok(())
}

fn print_summary(summary: &RunSummary, verbosity: Verbosity) {
    if verbosity == Verbosity::Silent {
        return;
    }
    let width = console::Term::stdout().size().1 as usize;
    let stats = format!(
        " URLs: {} - Completed: {} - Failed: {} ",
        summary.requested,
        summary.completed(),
        summary.failed.len()
    );
    println!("{}", center(&stats, width.saturating_sub(1), '-'));

    if verbosity == Verbosity::Quiet {
        return;
    }
    if !summary.failed.is_empty() {
        println!("Failed URLs:");
        for url in &summary.failed {
            println!("{}", url);
        }
        println!();
    }
    if !summary.unplaced.is_empty() {
        println!("Downloaded but not placed:");
        for item in &summary.unplaced {
            println!("{} ({})", item.download.url, item.error);
        }
        println!();
    }
}
