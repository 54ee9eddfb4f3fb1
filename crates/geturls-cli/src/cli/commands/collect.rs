//! Gather URLs from input files or literal arguments, then apply the reject list.

use anyhow::Result;
use geturls_core::extract::{extract_urls, extract_urls_from_files, reject_extensions};

use crate::cli::Cli;

pub fn collect_urls(cli: &Cli) -> Result<Vec<String>> {
    let urls = if cli.input.is_empty() {
        extract_urls(&cli.urls)?
    } else {
        extract_urls_from_files(&cli.input)?
    };
    let before = urls.len();
    let urls = reject_extensions(urls, &cli.reject);
    if urls.len() < before {
        tracing::info!(rejected = before - urls.len(), "urls dropped by reject list");
    }
    Ok(urls)
}

/// `--extract`: one URL per line.
pub fn print_urls(urls: &[String]) {
    for url in urls {
        println!("{}", url);
    }
}
