//! One full run: stage every URL, place what completed, log what was placed.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::download_log::append_log;
use crate::fetcher::Fetch;
use crate::placement::{LogRecord, PlacementEngine, PlacementPolicy, Unplaced};
use crate::progress::ProgressSink;
use crate::staging::stage_all;

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Destination root; must exist.
    pub dest_root: PathBuf,
    pub policy: PlacementPolicy,
    /// Replace files left by earlier runs (first occurrence of each name only).
    pub overwrite: bool,
    /// Courtesy delay between fetches.
    pub wait: Duration,
    /// CSV download log to append to.
    pub log_file: Option<PathBuf>,
}

/// What happened to the URLs of one run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub requested: usize,
    pub records: Vec<LogRecord>,
    pub failed: Vec<String>,
    pub unplaced: Vec<Unplaced>,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.records.len()
    }
}

/// Download `urls` and file them under `options.dest_root`.
///
/// Per-URL failures end up in the summary. Errors are returned only for run-level
/// problems: no staging area, an unusable destination root, or an unwritable log.
/// The staging area is removed on every path out of this function.
pub fn run<F: Fetch + ?Sized>(
    urls: &[String],
    options: &RunOptions,
    fetcher: &mut F,
    progress: &mut dyn ProgressSink,
) -> Result<RunSummary> {
    let staged = stage_all(urls, options.wait, fetcher, progress)?;
    let mut summary = RunSummary {
        requested: urls.len(),
        failed: staged.failed,
        ..RunSummary::default()
    };

    if staged.completed.is_empty() {
        tracing::warn!(requested = urls.len(), "no downloads completed, skipping placement");
        staged.staging.close()?;
        return Ok(summary);
    }

    let mut engine = PlacementEngine::new(&options.dest_root, options.overwrite)
        .with_context(|| format!("destination {}", options.dest_root.display()))?;
    let report = engine.place(staged.completed, options.policy);
    staged.staging.close()?;

    summary.records = report.records;
    summary.unplaced = report.unplaced;

    if let Some(log_file) = &options.log_file {
        append_log(log_file, &summary.records)?;
    }

    tracing::info!(
        requested = summary.requested,
        completed = summary.completed(),
        failed = summary.failed.len(),
        unplaced = summary.unplaced.len(),
        "run finished"
    );
    Ok(summary)
}
