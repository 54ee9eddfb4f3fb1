//! Download every URL into a per-run staging area.
//!
//! URLs are grouped by their decoded source directory (everything before the last
//! `/`). Each group gets one subdirectory of the staging root whose name is a
//! SHA-256 prefix of the group key, so grouping the same URLs twice gives the same
//! layout. Fetches run one at a time with an optional courtesy delay in between.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

use crate::fetcher::Fetch;
use crate::naming::{resolve_name, sanitize_filename};
use crate::progress::ProgressSink;

/// Hex characters kept from the group-key digest.
const SUBDIR_HASH_CHARS: usize = 16;

/// One URL to fetch, with the pieces of its decoded path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    /// Decoded URL up to (not including) the last `/`.
    pub source_dir: String,
    /// Decoded, sanitized last path segment.
    pub filename: String,
}

impl DownloadTask {
    pub fn from_url(url: &str) -> Self {
        let bytes = urlencoding::decode_binary(url.as_bytes());
        let decoded = String::from_utf8_lossy(&bytes).into_owned();
        let (source_dir, raw_name) = decoded.rsplit_once('/').unwrap_or(("", decoded.as_str()));
        Self {
            url: url.to_string(),
            source_dir: source_dir.to_string(),
            filename: sanitize_filename(raw_name),
        }
    }
}

/// Local date and time a download finished, as locale-style strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    pub date: String,
    pub time: String,
}

impl Timestamp {
    pub fn now() -> Self {
        let now = chrono::Local::now();
        Self {
            date: now.format("%x").to_string(),
            time: now.format("%X").to_string(),
        }
    }
}

/// A fetched file waiting in staging.
#[derive(Debug, Clone)]
pub struct CompletedDownload {
    /// Where the file sits now; no longer valid once placement moves it.
    pub staged_path: PathBuf,
    pub url: String,
    pub source_dir: String,
    pub filename: String,
    pub timestamp: Timestamp,
}

/// Per-run staging root, deleted recursively on drop or [`StagingArea::close`].
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("geturls_")
            .tempdir()
            .context("create staging directory")?;
        tracing::debug!(path = %dir.path().display(), "staging area created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Delete the staging tree now, reporting failure instead of ignoring it.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .with_context(|| format!("remove staging directory {}", path.display()))
    }
}

/// Result of staging a batch of URLs.
#[derive(Debug)]
pub struct StageOutcome {
    pub completed: Vec<CompletedDownload>,
    pub failed: Vec<String>,
    pub staging: StagingArea,
}

/// Group `urls` by source directory: groups in first-seen order, input order within.
pub fn group_by_dir(urls: &[String]) -> Vec<(String, Vec<DownloadTask>)> {
    let mut groups: Vec<(String, Vec<DownloadTask>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for url in urls {
        let task = DownloadTask::from_url(url);
        match index.get(&task.source_dir) {
            Some(&i) => groups[i].1.push(task),
            None => {
                index.insert(task.source_dir.clone(), groups.len());
                groups.push((task.source_dir.clone(), vec![task]));
            }
        }
    }
    groups
}

/// Staging subdirectory name for a group key.
pub fn staging_subdir_name(source_dir: &str) -> String {
    let digest = Sha256::digest(source_dir.as_bytes());
    let mut name = hex::encode(digest);
    name.truncate(SUBDIR_HASH_CHARS);
    name
}

/// Fetch every URL into a fresh staging area.
///
/// Failures are collected, never returned as errors; only creating the staging
/// area itself can fail the call.
pub fn stage_all<F: Fetch + ?Sized>(
    urls: &[String],
    wait: Duration,
    fetcher: &mut F,
    progress: &mut dyn ProgressSink,
) -> Result<StageOutcome> {
    let staging = StagingArea::create()?;
    let mut completed = Vec::new();
    let mut failed = Vec::new();
    // subdir name -> group key, to keep two groups out of one subdirectory
    let mut subdir_owner: HashMap<String, String> = HashMap::new();
    let mut fetched = 0usize;

    for (source_dir, tasks) in group_by_dir(urls) {
        let subdir = unique_subdir(&mut subdir_owner, &source_dir);
        let group_dir = staging.path().join(&subdir);
        if let Err(e) = fs::create_dir_all(&group_dir) {
            tracing::warn!(dir = %group_dir.display(), error = %e, "cannot create staging subdirectory");
            failed.extend(tasks.into_iter().map(|t| t.url));
            continue;
        }

        let mut staged_names: HashSet<String> = HashSet::new();
        for task in tasks {
            if fetched > 0 && !wait.is_zero() {
                thread::sleep(wait);
            }
            fetched += 1;

            // Same filename twice in one group: keep both staged copies apart.
            let staged_name =
                resolve_name(staged_names.iter().map(String::as_str), &task.filename);
            staged_names.insert(staged_name.clone());
            let staged_path = group_dir.join(&staged_name);

            match fetcher.fetch(&task.url, &staged_path, progress) {
                Ok(stats) => {
                    tracing::info!(url = %task.url, bytes = stats.bytes, "downloaded");
                    completed.push(CompletedDownload {
                        staged_path,
                        url: task.url,
                        source_dir: task.source_dir,
                        filename: task.filename,
                        timestamp: Timestamp::now(),
                    });
                }
                Err(e) => {
                    tracing::warn!(url = %task.url, error = %e, "download failed");
                    failed.push(task.url);
                }
            }
        }
    }

    progress.finish();
    Ok(StageOutcome {
        completed,
        failed,
        staging,
    })
}

fn unique_subdir(owners: &mut HashMap<String, String>, source_dir: &str) -> String {
    let base = staging_subdir_name(source_dir);
    let mut name = base.clone();
    let mut n = 1;
    while let Some(owner) = owners.get(&name) {
        if owner == source_dir {
            return name;
        }
        name = format!("{}-{}", base, n);
        n += 1;
    }
    owners.insert(name.clone(), source_dir.to_string());
    name
}
