//! Collision-free destination names.
//!
//! A name that already exists in the target directory gets a numeric suffix
//! one past the highest `base-<n>` already present (`a.txt`, `a-1.txt` -> `a-2.txt`).
//! Zero padding of the highest suffix is kept (`a-01.txt` -> `a-02.txt`).

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Split `filename` into base and extension.
///
/// No `.`, or a dotfile with a single dot, has no extension. An extension
/// containing punctuation is cut at the first non-alphanumeric character
/// (`page.php?id=3` -> `("page", "php")`).
pub fn split_name(filename: &str) -> (&str, Option<&str>) {
    let dotfile_only = filename.starts_with('.') && filename.matches('.').count() == 1;
    let (base, ext) = match filename.rsplit_once('.') {
        Some(parts) if !dotfile_only => parts,
        _ => return (filename, None),
    };
    let end = ext
        .char_indices()
        .find(|(_, c)| !c.is_alphanumeric())
        .map(|(i, _)| i)
        .unwrap_or(ext.len());
    let ext = &ext[..end];
    if ext.is_empty() {
        (filename, None)
    } else {
        (base, Some(ext))
    }
}

/// Alphanumeric extension of `filename`, if it has one.
pub fn file_type(filename: &str) -> Option<&str> {
    split_name(filename).1
}

/// Pick a name for `candidate` that is not among `existing`.
///
/// Only the exact name and `base-<n>[.ext]` forms count as taken, so
/// `banana.txt` does not push `nana.txt` to a suffixed name.
pub fn resolve_name<'a, I>(existing: I, candidate: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let (base, ext) = split_name(candidate);
    let pattern = match ext {
        Some(ext) => format!(r"^{}-(\d+)\.{}$", regex::escape(base), regex::escape(ext)),
        None => format!(r"^{}-(\d+)$", regex::escape(base)),
    };
    let Ok(numbered) = Regex::new(&pattern) else {
        return candidate.to_string();
    };

    // (value, digits as written)
    let mut highest: Option<(u64, String)> = None;
    for name in existing {
        let found = if name == candidate {
            Some((0, String::new()))
        } else {
            numbered.captures(name).and_then(|caps| {
                let digits = caps.get(1)?.as_str();
                digits.parse::<u64>().ok().map(|n| (n, digits.to_string()))
            })
        };
        if let Some((n, digits)) = found {
            // Equal values: the wider spelling wins, whatever the listing order.
            let higher = highest.as_ref().map_or(true, |(max, widest)| {
                n > *max || (n == *max && digits.len() > widest.len())
            });
            if higher {
                highest = Some((n, digits));
            }
        }
    }

    let Some((max, digits)) = highest else {
        return candidate.to_string();
    };
    let next = max.saturating_add(1);
    let suffix = if digits.len() > 1 && digits.starts_with('0') {
        format!("{:0width$}", next, width = digits.len())
    } else {
        next.to_string()
    };
    match ext {
        Some(ext) => format!("{}-{}.{}", base, suffix, ext),
        None => format!("{}-{}", base, suffix),
    }
}

/// Names handed out during one run, per destination directory.
///
/// The directory listing alone is not enough: a name is reserved the moment it is
/// chosen, before the file lands, so two placements of `a.txt` never resolve to
/// the same path.
#[derive(Debug, Default)]
pub struct NameCache {
    /// Original filenames seen this run.
    seen: HashSet<String>,
    reserved: HashMap<PathBuf, HashSet<String>>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose and reserve the final name for `candidate` in `dir`.
    ///
    /// With `overwrite`, the first occurrence of a name this run keeps it as-is
    /// (replacing a file from an earlier run). Later occurrences, and names already
    /// reserved in `dir`, are always suffixed.
    pub fn reserve(&mut self, dir: &Path, candidate: &str, overwrite: bool) -> io::Result<String> {
        let first_occurrence = self.seen.insert(candidate.to_string());
        let taken = self.reserved.entry(dir.to_path_buf()).or_default();

        let name = if overwrite && first_occurrence && !taken.contains(candidate) {
            candidate.to_string()
        } else {
            let listed = list_names(dir)?;
            resolve_name(
                listed
                    .iter()
                    .map(String::as_str)
                    .chain(taken.iter().map(String::as_str)),
                candidate,
            )
        };

        taken.insert(name.clone());
        Ok(name)
    }

    pub fn is_reserved(&self, dir: &Path, name: &str) -> bool {
        self.reserved
            .get(dir)
            .map_or(false, |names| names.contains(name))
    }
}

/// Entry names in `dir`; a missing directory has none.
fn list_names(dir: &Path) -> io::Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut names = Vec::new();
    for entry in entries {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}
