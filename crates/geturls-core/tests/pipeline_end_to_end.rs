//! Integration test: full runs (stage, place, log) against loopback file servers.

mod common;

use common::file_server::{self, FileServerOptions};
use geturls_core::config::FetchConfig;
use geturls_core::fetcher::Fetcher;
use geturls_core::pipeline::{self, RunOptions};
use geturls_core::placement::PlacementPolicy;
use geturls_core::progress::{ProgressSink, SilentProgress};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

fn options(dest: &Path, policy: PlacementPolicy, log_file: Option<&Path>) -> RunOptions {
    RunOptions {
        dest_root: dest.to_path_buf(),
        policy,
        overwrite: false,
        wait: Duration::ZERO,
        log_file: log_file.map(Path::to_path_buf),
    }
}

#[derive(Default)]
struct Notices {
    resets: usize,
    no_headers: usize,
}

impl ProgressSink for Notices {
    fn reset(&mut self, _total_bytes: u64, _url: &str) {
        self.resets += 1;
    }
    fn update(&mut self, _chunk_bytes: u64) {}
    fn no_byte_headers(&mut self, _url: &str) {
        self.no_headers += 1;
    }
    fn timeout(&mut self) {}
}

#[test]
fn by_type_places_into_extension_dir_and_logs() {
    let base = file_server::start(&[("/dir/a.txt", &b"alpha"[..]), ("/dir/b.txt", &b"beta"[..])]);
    let dest = tempdir().unwrap();
    let log = dest.path().join("downloads.csv");
    let urls = vec![format!("{}/dir/a.txt", base), format!("{}/dir/b.txt", base)];

    let mut fetcher = Fetcher::new(FetchConfig::default());
    let summary = pipeline::run(
        &urls,
        &options(dest.path(), PlacementPolicy::ByType, Some(&log)),
        &mut fetcher,
        &mut SilentProgress,
    )
    .expect("run");

    let txt = fs::canonicalize(dest.path()).unwrap().join("txt");
    assert_eq!(fs::read(txt.join("a.txt")).unwrap(), b"alpha");
    assert_eq!(fs::read(txt.join("b.txt")).unwrap(), b"beta");
    assert_eq!(summary.completed(), 2);
    assert!(summary.failed.is_empty());

    let rows: Vec<String> = fs::read_to_string(&log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(rows.len(), 2);
    for (row, name) in rows.iter().zip(["a.txt", "b.txt"]) {
        let path = row.rsplit(',').next().unwrap();
        assert!(Path::new(path).is_absolute(), "{}", row);
        assert_eq!(Path::new(path), txt.join(name));
    }
}

#[test]
fn flat_same_name_from_two_hosts_gets_suffix() {
    let one = file_server::start(&[("/file.txt", &b"from one"[..])]);
    let two = file_server::start(&[("/file.txt", &b"from two"[..])]);
    let dest = tempdir().unwrap();
    let urls = vec![format!("{}/file.txt", one), format!("{}/file.txt", two)];

    let mut fetcher = Fetcher::new(FetchConfig::default());
    let summary = pipeline::run(
        &urls,
        &options(dest.path(), PlacementPolicy::Flat, None),
        &mut fetcher,
        &mut SilentProgress,
    )
    .expect("run");

    let root = fs::canonicalize(dest.path()).unwrap();
    assert_eq!(fs::read(root.join("file.txt")).unwrap(), b"from one");
    assert_eq!(fs::read(root.join("file-1.txt")).unwrap(), b"from two");
    assert_eq!(summary.records.len(), 2);
    assert_ne!(summary.records[0].final_path, summary.records[1].final_path);
}

#[test]
fn missing_content_length_still_logged() {
    let base = file_server::start_with_options(
        &[("/docs/readme.md", &b"# hello"[..])],
        FileServerOptions {
            send_length: false,
            ..FileServerOptions::default()
        },
    );
    let dest = tempdir().unwrap();
    let log = dest.path().join("log.csv");
    let urls = vec![format!("{}/docs/readme.md", base)];
    let mut notices = Notices::default();

    let mut fetcher = Fetcher::new(FetchConfig::default());
    let summary = pipeline::run(
        &urls,
        &options(dest.path(), PlacementPolicy::Flat, Some(&log)),
        &mut fetcher,
        &mut notices,
    )
    .expect("run");

    assert_eq!(summary.records.len(), 1);
    assert_eq!(notices.no_headers, 1);
    assert_eq!(notices.resets, 0);
    assert_eq!(fs::read_to_string(&log).unwrap().lines().count(), 1);
    assert_eq!(
        fs::read(fs::canonicalize(dest.path()).unwrap().join("readme.md")).unwrap(),
        b"# hello"
    );
}

#[test]
fn all_unreachable_skips_placement_and_log() {
    let dest = tempdir().unwrap();
    let log = dest.path().join("log.csv");
    fs::write(&log, "earlier,run,http://x/y,/z\n").unwrap();
    let urls = vec![
        "http://127.0.0.1:1/a/one.txt".to_string(),
        "http://127.0.0.1:1/b/two.txt".to_string(),
    ];

    let mut fetcher = Fetcher::new(FetchConfig::default());
    let summary = pipeline::run(
        &urls,
        &options(dest.path(), PlacementPolicy::ByType, Some(&log)),
        &mut fetcher,
        &mut SilentProgress,
    )
    .expect("total failure is not a run error");

    assert_eq!(summary.requested, 2);
    assert!(summary.records.is_empty());
    assert_eq!(summary.failed, urls);
    assert_eq!(
        fs::read_to_string(&log).unwrap(),
        "earlier,run,http://x/y,/z\n"
    );
    // only the pre-existing log file is in the destination
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 1);
}

#[test]
fn partial_failure_places_the_rest() {
    let base = file_server::start(&[("/ok/good.bin", &b"good"[..])]);
    let dest = tempdir().unwrap();
    let urls = vec![
        format!("{}/ok/missing.bin", base),
        format!("{}/ok/good.bin", base),
    ];

    let mut fetcher = Fetcher::new(FetchConfig::default());
    let summary = pipeline::run(
        &urls,
        &options(dest.path(), PlacementPolicy::ByHost, None),
        &mut fetcher,
        &mut SilentProgress,
    )
    .expect("run");

    assert_eq!(summary.failed, vec![urls[0].clone()]);
    assert_eq!(summary.records.len(), 1);
    let host = base.trim_start_matches("http://");
    let expected = fs::canonicalize(dest.path())
        .unwrap()
        .join(host)
        .join("ok")
        .join("good.bin");
    assert_eq!(summary.records[0].final_path, expected);
    assert_eq!(fs::read(expected).unwrap(), b"good");
}
