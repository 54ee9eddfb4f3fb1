//! Route staged downloads into the destination tree.
//!
//! The policy picks a subdirectory for each download (none, its extension, its
//! host/path tree, or a name cluster). Every final name goes through the run's
//! [`NameCache`], then the file is renamed out of staging. A download that cannot
//! be placed is reported back as unplaced, never dropped.

mod host;
mod mover;

pub use host::host_tree;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cluster::{cluster_names, ClusterPlan};
use crate::dirs::confirm_directory;
use crate::naming::{file_type, NameCache};
use crate::staging::CompletedDownload;
use mover::move_file;

/// Bucket for files without a usable extension (by-type policy).
pub const UNKNOWN_FILETYPE: &str = "unknown_filetype";

/// How completed downloads are laid out under the destination root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// Straight into the root.
    #[default]
    Flat,
    /// `<root>/<extension>/`.
    ByType,
    /// `<root>/<host>/<path...>/`.
    ByHost,
    /// `<root>/<shared name token>/`, or the root when nothing matches.
    ByName,
}

#[derive(Debug, Error)]
pub enum PlacementError {
    /// A directory the policy needs already exists as something else.
    #[error("{} exists and is not a directory", .0.display())]
    DirectoryConflict(PathBuf),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PlacementError {
    fn io(path: &Path, source: io::Error) -> Self {
        PlacementError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One placed file, as written to the download log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub date: String,
    pub time: String,
    pub url: String,
    /// Absolute path of the placed file.
    pub final_path: PathBuf,
}

/// A completed download left in staging, and why.
#[derive(Debug)]
pub struct Unplaced {
    pub download: CompletedDownload,
    pub error: PlacementError,
}

#[derive(Debug, Default)]
pub struct PlacementReport {
    pub records: Vec<LogRecord>,
    pub unplaced: Vec<Unplaced>,
}

/// Places downloads under one destination root for the length of a run.
pub struct PlacementEngine {
    root: PathBuf,
    overwrite: bool,
    names: NameCache,
    /// host/path key -> tree to use (the root when the tree could not be created)
    host_dirs: HashMap<PathBuf, PathBuf>,
}

impl PlacementEngine {
    /// Engine rooted at `root`, which must already exist as a directory.
    pub fn new(root: &Path, overwrite: bool) -> Result<Self, PlacementError> {
        let root = fs::canonicalize(root).map_err(|e| PlacementError::io(root, e))?;
        if !root.is_dir() {
            return Err(PlacementError::DirectoryConflict(root));
        }
        Ok(Self {
            root,
            overwrite,
            names: NameCache::new(),
            host_dirs: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Move every download to its destination under `policy`.
    pub fn place(
        &mut self,
        completed: Vec<CompletedDownload>,
        policy: PlacementPolicy,
    ) -> PlacementReport {
        let mut report = PlacementReport::default();
        let clusters = match policy {
            PlacementPolicy::ByName => self.plan_clusters(&completed),
            _ => ClusterPlan::default(),
        };
        // subdir -> confirm_directory result, so each is checked once
        let mut confirmed: HashMap<PathBuf, bool> = HashMap::new();

        for download in completed {
            let dir = match policy {
                PlacementPolicy::Flat => Ok(self.root.clone()),
                PlacementPolicy::ByType => {
                    let bucket = file_type(&download.filename).unwrap_or(UNKNOWN_FILETYPE);
                    let dir = self.root.join(bucket);
                    confirm_cached(&mut confirmed, &dir).map(|()| dir)
                }
                PlacementPolicy::ByHost => Ok(self.host_dir(&download.source_dir)),
                PlacementPolicy::ByName => match clusters.subdir_for(&download.filename) {
                    Some(subdir) => {
                        let dir = self.root.join(subdir);
                        match confirm_cached(&mut confirmed, &dir) {
                            Ok(()) => Ok(dir),
                            Err(e) => {
                                tracing::warn!(error = %e, "name cluster unusable, using root");
                                Ok(self.root.clone())
                            }
                        }
                    }
                    None => Ok(self.root.clone()),
                },
            };

            match dir.and_then(|dir| self.place_one(&download, &dir)) {
                Ok(record) => {
                    tracing::info!(
                        url = %record.url,
                        path = %record.final_path.display(),
                        "placed"
                    );
                    report.records.push(record);
                }
                Err(error) => {
                    tracing::warn!(url = %download.url, error = %error, "not placed");
                    report.unplaced.push(Unplaced { download, error });
                }
            }
        }
        report
    }

    fn place_one(
        &mut self,
        download: &CompletedDownload,
        dir: &Path,
    ) -> Result<LogRecord, PlacementError> {
        let name = self
            .names
            .reserve(dir, &download.filename, self.overwrite)
            .map_err(|e| PlacementError::io(dir, e))?;
        let final_path = dir.join(name);
        move_file(&download.staged_path, &final_path)
            .map_err(|e| PlacementError::io(&final_path, e))?;
        Ok(LogRecord {
            date: download.timestamp.date.clone(),
            time: download.timestamp.time.clone(),
            url: download.url.clone(),
            final_path,
        })
    }

    /// Host/path tree for `source_dir`, created once per run; the root if it cannot be.
    fn host_dir(&mut self, source_dir: &str) -> PathBuf {
        let tree = host_tree(source_dir);
        if let Some(dir) = self.host_dirs.get(&tree) {
            return dir.clone();
        }
        let target = self.root.join(&tree);
        let dir = match fs::create_dir_all(&target) {
            Ok(()) => target,
            Err(e) => {
                tracing::warn!(
                    tree = %target.display(),
                    error = %e,
                    "host tree unusable, placing in root"
                );
                self.root.clone()
            }
        };
        self.host_dirs.insert(tree, dir.clone());
        dir
    }

    fn plan_clusters(&self, completed: &[CompletedDownload]) -> ClusterPlan {
        let (dirs, files) = match list_root(&self.root) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(error = %e, "cannot list destination, clustering without it");
                (Vec::new(), HashSet::new())
            }
        };
        let names: Vec<&str> = completed.iter().map(|d| d.filename.as_str()).collect();
        cluster_names(&names, &dirs, &files)
    }
}

/// Place `completed` under `root` with a fresh engine.
pub fn place(
    root: &Path,
    completed: Vec<CompletedDownload>,
    policy: PlacementPolicy,
    overwrite: bool,
) -> Result<PlacementReport, PlacementError> {
    let mut engine = PlacementEngine::new(root, overwrite)?;
    Ok(engine.place(completed, policy))
}

fn confirm_cached(confirmed: &mut HashMap<PathBuf, bool>, dir: &Path) -> Result<(), PlacementError> {
    let is_dir = match confirmed.get(dir) {
        Some(&is_dir) => is_dir,
        None => {
            let is_dir = confirm_directory(dir).map_err(|e| PlacementError::io(dir, e))?;
            confirmed.insert(dir.to_path_buf(), is_dir);
            is_dir
        }
    };
    if is_dir {
        Ok(())
    } else {
        Err(PlacementError::DirectoryConflict(dir.to_path_buf()))
    }
}

/// Names of subdirectories and plain files directly under `root`, sorted.
fn list_root(root: &Path) -> io::Result<(Vec<String>, HashSet<String>)> {
    let mut dirs = Vec::new();
    let mut files = HashSet::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_dir() {
            dirs.push(name);
        } else {
            files.insert(name);
        }
    }
    dirs.sort();
    Ok((dirs, files))
}
