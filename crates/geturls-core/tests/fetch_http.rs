//! Integration test: single fetches against a loopback file server.

mod common;

use common::file_server::{self, FileServerOptions};
use geturls_core::config::FetchConfig;
use geturls_core::fetcher::{Fetch, FetchError, Fetcher, Strategy};
use geturls_core::progress::{ProgressSink, SilentProgress};
use geturls_core::rate::RateSource;
use std::time::Instant;
use tempfile::tempdir;

#[derive(Default)]
struct Counting {
    resets: Vec<u64>,
    bytes: u64,
    no_headers: usize,
    timeouts: usize,
}

impl ProgressSink for Counting {
    fn reset(&mut self, total_bytes: u64, _url: &str) {
        self.resets.push(total_bytes);
    }
    fn update(&mut self, chunk_bytes: u64) {
        self.bytes += chunk_bytes;
    }
    fn no_byte_headers(&mut self, _url: &str) {
        self.no_headers += 1;
    }
    fn timeout(&mut self) {
        self.timeouts += 1;
    }
}

/// Rate source that never sees any throughput.
struct ZeroRate;

impl RateSource for ZeroRate {
    fn reset(&mut self, _now: Instant) {}
    fn record(&mut self, _bytes: u64, _now: Instant) -> f64 {
        0.0
    }
    fn rate(&self) -> f64 {
        0.0
    }
}

fn body(len: usize) -> Vec<u8> {
    (0u8..=250).cycle().take(len).collect()
}

#[test]
fn streamed_download_matches_body() {
    let data = body(200 * 1024);
    let base = file_server::start(&[("/files/big.bin", &data[..])]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("big.bin");
    let mut progress = Counting::default();

    let mut fetcher = Fetcher::new(FetchConfig::default());
    let stats = fetcher
        .fetch(&format!("{}/files/big.bin", base), &dest, &mut progress)
        .expect("fetch");

    assert_eq!(stats.strategy, Strategy::Streamed);
    assert_eq!(stats.bytes, data.len() as u64);
    assert!(stats.final_chunk_bytes.is_some());
    assert_eq!(progress.resets, vec![data.len() as u64]);
    assert_eq!(progress.bytes, data.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), data);
}

#[test]
fn missing_content_length_uses_whole_body() {
    let data = body(10_000);
    let base = file_server::start_with_options(
        &[("/a.txt", &data[..])],
        FileServerOptions {
            send_length: false,
            ..FileServerOptions::default()
        },
    );
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.txt");
    let mut progress = Counting::default();

    let stats = Fetcher::new(FetchConfig::default())
        .fetch(&format!("{}/a.txt", base), &dest, &mut progress)
        .expect("fetch");

    assert_eq!(stats.strategy, Strategy::WholeBody);
    assert!(stats.rate.is_none());
    assert_eq!(progress.no_headers, 1);
    assert!(progress.resets.is_empty());
    assert_eq!(std::fs::read(&dest).unwrap(), data);
}

#[test]
fn missing_accept_ranges_uses_whole_body() {
    let data = body(4096);
    let base = file_server::start_with_options(
        &[("/a.bin", &data[..])],
        FileServerOptions {
            advertise_ranges: false,
            ..FileServerOptions::default()
        },
    );
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.bin");

    let stats = Fetcher::new(FetchConfig::default())
        .fetch(&format!("{}/a.bin", base), &dest, &mut SilentProgress)
        .expect("fetch");

    assert_eq!(stats.strategy, Strategy::WholeBody);
    assert_eq!(stats.bytes, 4096);
}

#[test]
fn not_found_is_http_error() {
    let base = file_server::start(&[]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("missing.txt");

    let err = Fetcher::new(FetchConfig::default())
        .fetch(&format!("{}/missing.txt", base), &dest, &mut SilentProgress)
        .unwrap_err();

    assert!(matches!(err, FetchError::Http(404)), "{:?}", err);
    assert!(!dest.exists());
}

#[test]
fn refused_connection_is_unreachable() {
    let dir = tempdir().unwrap();
    let err = Fetcher::new(FetchConfig::default())
        .fetch("http://127.0.0.1:1/x.txt", &dir.path().join("x.txt"), &mut SilentProgress)
        .unwrap_err();
    assert!(matches!(err, FetchError::Unreachable(_)), "{:?}", err);
}

#[test]
fn zero_rate_stalls_instead_of_looping() {
    let data = body(64 * 1024);
    let base = file_server::start(&[("/slow.bin", &data[..])]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("slow.bin");
    let mut progress = Counting::default();

    let mut fetcher = Fetcher::with_rate_source(FetchConfig::default(), ZeroRate);
    let err = fetcher
        .fetch(&format!("{}/slow.bin", base), &dest, &mut progress)
        .unwrap_err();

    assert!(matches!(err, FetchError::Stalled), "{:?}", err);
    assert_eq!(progress.timeouts, 1);
    assert!(progress.bytes < data.len() as u64);
}

#[test]
fn fetcher_is_reusable_across_urls() {
    let a = body(5000);
    let b = body(7000);
    let base = file_server::start(&[("/a", &a[..]), ("/b", &b[..])]);
    let dir = tempdir().unwrap();
    let mut progress = Counting::default();
    let mut fetcher = Fetcher::new(FetchConfig::default());

    fetcher
        .fetch(&format!("{}/a", base), &dir.path().join("a"), &mut progress)
        .unwrap();
    fetcher
        .fetch(&format!("{}/b", base), &dir.path().join("b"), &mut progress)
        .unwrap();

    assert_eq!(progress.resets, vec![5000, 7000]);
    assert_eq!(std::fs::read(dir.path().join("b")).unwrap(), b);
}
