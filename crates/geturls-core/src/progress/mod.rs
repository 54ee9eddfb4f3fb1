//! Progress reporting for sequential downloads.
//!
//! The fetcher drives a [`ProgressSink`] passed in by the caller; nothing here is
//! global. [`for_verbosity`] picks the implementation once per run: a silent sink
//! that renders nothing, or a [`ProgressDisplay`] drawing either a one-line
//! counter (quiet) or a two-line bar with rate.

mod display;
pub mod format;

pub use display::{BarStyle, ProgressDisplay, TermWidth};

use std::io;

/// Receiver of per-download progress events.
pub trait ProgressSink {
    /// Start a new item of `total_bytes`; finalizes the previous one (flagging it
    /// incomplete if it never reached its total).
    fn reset(&mut self, total_bytes: u64, url: &str);

    /// `chunk_bytes` more bytes were written for the current item.
    fn update(&mut self, chunk_bytes: u64);

    /// The response for `url` carries no usable byte headers; progress is not tracked.
    fn no_byte_headers(&mut self, url: &str);

    /// Throughput dropped to zero; the caller aborts the fetch.
    fn timeout(&mut self);

    /// End of run: leave the terminal on a clean line.
    fn finish(&mut self) {}
}

/// How much the run prints while downloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Two-line bar with rate.
    #[default]
    Normal,
    /// One-line running counter.
    Quiet,
    /// Nothing at all.
    Silent,
}

/// Sink that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn reset(&mut self, _total_bytes: u64, _url: &str) {}
    fn update(&mut self, _chunk_bytes: u64) {}
    fn no_byte_headers(&mut self, _url: &str) {}
    fn timeout(&mut self) {}
}

/// Build the sink for a run of `nfiles` URLs, writing to stdout.
pub fn for_verbosity(verbosity: Verbosity, nfiles: usize) -> Box<dyn ProgressSink> {
    match verbosity {
        Verbosity::Silent => Box::new(SilentProgress),
        Verbosity::Quiet => Box::new(ProgressDisplay::new(
            io::stdout(),
            BarStyle::Quiet,
            nfiles,
            TermWidth::Detect,
        )),
        Verbosity::Normal => Box::new(ProgressDisplay::new(
            io::stdout(),
            BarStyle::Bar,
            nfiles,
            TermWidth::Detect,
        )),
    }
}
