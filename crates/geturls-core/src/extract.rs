//! Find downloadable URLs in free text.
//!
//! A candidate is one space-separated word that, after leading punctuation is
//! stripped, looks like `[scheme://][www.]host.tld[:port]/path` with a path that
//! does not end in `/`. A missing scheme becomes `http://`.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::Path;

const URL_PATTERN: &str = r"^(?:(?:https?)://)?(?:www\.)?(?:(?:[\w\-]+\.)+[a-z]{2,}|\d{1,3}(?:\.\d{1,3}){3}|localhost)(?::\d+)?/.*[^/]$";

/// Compiled URL matcher.
#[derive(Debug, Clone)]
pub struct UrlExtractor {
    pattern: Regex,
}

impl UrlExtractor {
    pub fn new() -> Result<Self> {
        let pattern = RegexBuilder::new(URL_PATTERN)
            .case_insensitive(true)
            .build()
            .context("compile URL pattern")?;
        Ok(Self { pattern })
    }

    /// URLs in `lines`, in the order they appear (duplicates kept).
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Vec<String> {
        let mut found = Vec::new();
        for line in lines {
            for word in line.as_ref().split(' ') {
                if word.is_empty() || word.chars().all(char::is_alphanumeric) {
                    continue;
                }
                let word = word.trim_start_matches(|c: char| c.is_ascii_punctuation());
                if self.pattern.is_match(word) {
                    found.push(with_scheme(word));
                }
            }
        }
        found
    }
}

fn with_scheme(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

/// URLs in `lines`, in order.
pub fn extract_urls<S: AsRef<str>>(lines: &[S]) -> Result<Vec<String>> {
    Ok(UrlExtractor::new()?.extract(lines))
}

/// URLs in the non-blank lines of every file. More than one URL comes back
/// sorted and de-duplicated.
pub fn extract_urls_from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<String>> {
    let extractor = UrlExtractor::new()?;
    let mut urls = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read input file {}", path.display()))?;
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        urls.extend(extractor.extract(&lines));
    }
    if urls.len() > 1 {
        urls.sort();
        urls.dedup();
    }
    Ok(urls)
}

/// Drop URLs ending in any of `extensions` (leading `.` optional).
pub fn reject_extensions(urls: Vec<String>, extensions: &[String]) -> Vec<String> {
    if extensions.is_empty() {
        return urls;
    }
    let suffixes: Vec<String> = extensions
        .iter()
        .map(|ext| {
            if ext.starts_with('.') {
                ext.clone()
            } else {
                format!(".{}", ext)
            }
        })
        .collect();
    urls.into_iter()
        .filter(|url| !suffixes.iter().any(|suffix| url.ends_with(suffix.as_str())))
        .collect()
}
