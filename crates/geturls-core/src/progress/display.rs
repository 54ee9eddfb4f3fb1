//! Terminal progress display.
//!
//! Bar style (two lines, redrawn in place):
//!
//! ```text
//! (3/5) ...://test-url-dot-com/folder_0003/file_03.txt      [  5.41MB/7.90MB]
//! [#############################################------------]        3.25MBps
//! ```
//!
//! Finished items collapse to one line, `(1/5) <url>   5.90MB : 1.50sec`.
//! Quiet style keeps only the first line and overwrites it on every update.

use std::io::Write;
use std::time::Instant;

use super::format::{byte_unit, center, pad_right, time_unit, truncate_url};
use super::ProgressSink;
use crate::rate::{RateSource, RateTracker};

/// Columns reserved on the bar line for the rate text.
const RATE_COLUMNS: usize = 19;
/// Columns reserved next to the URL for the counter and byte totals.
const URL_RESERVED_COLUMNS: usize = 29;
/// Narrowest width we lay out for; smaller terminals get this anyway.
const MIN_WIDTH: usize = 40;

const CURSOR_UP: &str = "\x1b[1A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarStyle {
    Bar,
    Quiet,
}

/// Where the line width comes from.
#[derive(Debug, Clone, Copy)]
pub enum TermWidth {
    /// Ask the terminal (falls back to 79 columns when stdout is not a tty).
    Detect,
    Fixed(usize),
    /// Ask a caller-supplied function each time.
    With(fn() -> usize),
}

impl TermWidth {
    fn columns(self) -> usize {
        let cols = match self {
            TermWidth::Detect => console::Term::stdout().size().1 as usize,
            TermWidth::Fixed(n) => n,
            TermWidth::With(columns) => columns(),
        };
        // Stay one short of the edge so a full line never auto-wraps.
        cols.saturating_sub(1).max(MIN_WIDTH)
    }
}

pub struct ProgressDisplay<W: Write> {
    out: W,
    style: BarStyle,
    width_source: TermWidth,
    width: usize,
    bar_length: usize,
    current_fileno: usize,
    nfiles: usize,
    url: String,
    total_bytes: u64,
    current_total: u64,
    last_ix: usize,
    complete: bool,
    /// Last rendered text, replayed when an item is abandoned mid-way.
    text_cache: String,
    start: Instant,
    rate: RateTracker,
    download_rate: f64,
}

impl<W: Write> ProgressDisplay<W> {
    pub fn new(out: W, style: BarStyle, nfiles: usize, width_source: TermWidth) -> Self {
        let width = width_source.columns();
        Self {
            out,
            style,
            width_source,
            width,
            bar_length: width - RATE_COLUMNS,
            current_fileno: 0,
            nfiles,
            url: String::new(),
            total_bytes: 0,
            current_total: 0,
            last_ix: 0,
            complete: false,
            text_cache: String::new(),
            start: Instant::now(),
            rate: RateTracker::default(),
            download_rate: 0.0,
        }
    }

    /// Index of the item being displayed (1-based; 0 before the first reset).
    pub fn current_fileno(&self) -> usize {
        self.current_fileno
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Line width in use for the current item.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn bar_length(&self) -> usize {
        self.bar_length
    }

    /// Consume the display and hand back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        // Terminal output is best effort; a closed stdout must not fail the download.
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn fileno_status(&self) -> String {
        format!("({}/{}) ", self.current_fileno, self.nfiles)
    }

    /// `(i/n) <url>      [cur/total] ` or, once complete, `(i/n) <url>   total : elapsed `.
    fn running_total(&self, complete: bool) -> String {
        let status = self.fileno_status();
        let cur_bytes = if complete {
            format!(
                "{} : {} ",
                byte_unit(self.total_bytes as f64, false),
                time_unit(self.start.elapsed().as_secs_f64())
            )
        } else {
            format!(
                "[{}/{}] ",
                byte_unit(self.current_total as f64, true),
                byte_unit(self.total_bytes as f64, false)
            )
        };
        let line_space = self
            .width
            .saturating_sub(cur_bytes.chars().count() + status.chars().count());
        let text_url = truncate_url(&self.url, self.width.saturating_sub(URL_RESERVED_COLUMNS));
        format!("{}{}{}", status, pad_right(&text_url, line_space), cur_bytes)
    }

    fn draw_bar(&self, ix: usize) -> String {
        let marks = "#".repeat(ix.min(self.bar_length));
        let dashes = "-".repeat(self.bar_length - marks.len());
        format!("[{}{}]", marks, dashes)
    }

    fn draw_display(&mut self, ix: usize, complete: bool) {
        let first = self.running_total(complete);
        let rate_text = format!("{}ps ", byte_unit(self.download_rate, true));
        let bar_space = self.width.saturating_sub(rate_text.chars().count());
        let second = format!("{}{}", pad_right(&self.draw_bar(ix), bar_space), rate_text);

        let text = format!(
            "\r{}\n{}",
            pad_right(&first, self.width),
            pad_right(&second, self.width)
        );
        self.text_cache = text.clone();
        if complete {
            // Keep the summary line, blank the bar line and park the cursor on it.
            let blank = " ".repeat(self.width);
            self.emit(&format!(
                "\r{}\n\r{}\r",
                pad_right(&first, self.width),
                blank
            ));
        } else {
            self.emit(&format!("{}{}\r", text, CURSOR_UP));
        }
    }

    fn update_total(&mut self, chunk_bytes: u64) {
        self.current_total += chunk_bytes;
        self.download_rate = self.rate.record(chunk_bytes, Instant::now());
    }

    fn text_update(&mut self, chunk_bytes: u64) {
        self.update_total(chunk_bytes);
        let line = self.running_total(false);
        self.text_cache = format!("\r{}", line);
        let text = self.text_cache.clone();
        self.emit(&text);
        if self.current_total >= self.total_bytes {
            self.complete = true;
        }
    }

    fn bar_update(&mut self, chunk_bytes: u64) {
        self.update_total(chunk_bytes);
        let progress = if self.total_bytes > 0 {
            self.current_total as f64 / self.total_bytes as f64
        } else {
            1.0
        };
        let ix = (progress * self.bar_length as f64) as usize;

        if self.complete {
            return;
        }
        if ix >= self.bar_length {
            self.draw_display(self.bar_length, true);
            self.complete = true;
        } else if ix > self.last_ix {
            self.last_ix = ix;
            self.draw_display(ix, false);
        }
    }

    /// Print the abandoned item's last state and flag it, when the previous item never completed.
    fn flag_incomplete(&mut self) {
        if self.complete || self.current_fileno == 0 {
            return;
        }
        let cached = self.text_cache.trim_start_matches('\r').to_string();
        let banner = center("Download Incomplete", self.width, '*');
        let rule = "=".repeat(self.width);
        self.emit(&format!("\r{}\n{}\n{}\n", cached, banner, rule));
    }
}

impl<W: Write> ProgressSink for ProgressDisplay<W> {
    fn reset(&mut self, total_bytes: u64, url: &str) {
        self.flag_incomplete();

        self.width = self.width_source.columns();
        self.bar_length = self.width - RATE_COLUMNS;
        self.url = url.to_string();
        self.current_fileno += 1;
        self.total_bytes = total_bytes;
        self.current_total = 0;
        self.last_ix = 0;
        self.complete = false;
        self.text_cache.clear();
        self.download_rate = 0.0;
        self.start = Instant::now();
        self.rate.reset(self.start);

        // Nothing will arrive for an empty body, so it is done as soon as it starts.
        if total_bytes == 0 {
            match self.style {
                BarStyle::Bar => self.draw_display(self.bar_length, true),
                BarStyle::Quiet => self.text_update(0),
            }
            self.complete = true;
        }
    }

    fn update(&mut self, chunk_bytes: u64) {
        match self.style {
            BarStyle::Bar => self.bar_update(chunk_bytes),
            BarStyle::Quiet => self.text_update(chunk_bytes),
        }
    }

    fn no_byte_headers(&mut self, url: &str) {
        self.reset(0, url);
        self.complete = true;
        let notice = format!("{}Missing byte headers - progress NA: ", self.fileno_status());
        let line_space = self.width.saturating_sub(notice.chars().count());
        let text = format!("{}{}", notice, truncate_url(&self.url, line_space));
        let mut out = format!("\r{}", pad_right(&text, self.width));
        if self.style == BarStyle::Bar {
            out.push('\n');
        }
        self.emit(&out);
    }

    fn timeout(&mut self) {
        let banner = center("CONNECTION TIMEOUT", self.width, '-');
        self.emit(&format!("\n{}\n", banner));
        // The timeout banner already closes the item; do not flag it again.
        self.complete = true;
    }

    fn finish(&mut self) {
        self.flag_incomplete();
        if self.style == BarStyle::Quiet && self.current_fileno > 0 {
            self.emit("\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(style: BarStyle) -> ProgressDisplay<Vec<u8>> {
        ProgressDisplay::new(Vec::new(), style, 3, TermWidth::Fixed(81))
    }

    fn output(d: ProgressDisplay<Vec<u8>>) -> String {
        String::from_utf8(d.into_inner()).unwrap()
    }

    #[test]
    fn reset_advances_file_counter() {
        let mut d = display(BarStyle::Bar);
        d.reset(10, "http://example.com/a.txt");
        assert_eq!(d.current_fileno(), 1);
        d.update(10);
        d.reset(10, "http://example.com/b.txt");
        assert_eq!(d.current_fileno(), 2);
        assert!(!d.is_complete());
    }

    #[test]
    fn bar_completes_at_total() {
        let mut d = display(BarStyle::Bar);
        d.reset(2500, "http://example.com/a.txt");
        d.update(1250);
        assert!(!d.is_complete());
        d.update(1250);
        assert!(d.is_complete());
        let text = output(d);
        assert!(text.contains("(1/3) http://example.com/a.txt"));
        assert!(text.contains("2.50KB : "));
        assert!(text.contains("[#"));
    }

    #[test]
    fn quiet_shows_running_total_only() {
        let mut d = display(BarStyle::Quiet);
        d.reset(4000, "http://example.com/q.bin");
        d.update(1000);
        d.update(3000);
        assert!(d.is_complete());
        let text = output(d);
        assert!(text.contains("[  1.00KB/4.00KB]"));
        assert!(!text.contains("[#"));
    }

    #[test]
    fn unfinished_item_is_flagged_on_next_reset() {
        let mut d = display(BarStyle::Bar);
        d.reset(10_000, "http://example.com/a.txt");
        d.update(5_000);
        d.reset(10, "http://example.com/b.txt");
        let text = output(d);
        assert!(text.contains("Download Incomplete"));
    }

    #[test]
    fn empty_item_is_complete_on_reset() {
        let mut d = display(BarStyle::Bar);
        d.reset(0, "http://example.com/empty.txt");
        assert!(d.is_complete());
        d.reset(10, "http://example.com/b.txt");
        let text = output(d);
        assert!(text.contains("(1/3) http://example.com/empty.txt"));
        assert!(!text.contains("Download Incomplete"));
    }

    #[test]
    fn width_is_read_again_on_reset() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COLUMNS: AtomicUsize = AtomicUsize::new(81);
        fn columns() -> usize {
            COLUMNS.load(Ordering::SeqCst)
        }

        let mut d = ProgressDisplay::new(Vec::new(), BarStyle::Bar, 2, TermWidth::With(columns));
        d.reset(10, "http://example.com/a.txt");
        assert_eq!(d.width(), 80);
        assert_eq!(d.bar_length(), 80 - RATE_COLUMNS);

        COLUMNS.store(121, Ordering::SeqCst);
        d.update(4);
        assert_eq!(d.width(), 80);
        d.reset(10, "http://example.com/b.txt");
        assert_eq!(d.width(), 120);
        assert_eq!(d.bar_length(), 120 - RATE_COLUMNS);
    }

    #[test]
    fn no_byte_headers_notice() {
        let mut d = display(BarStyle::Quiet);
        d.no_byte_headers("http://example.com/nolen");
        assert!(d.is_complete());
        let text = output(d);
        assert!(text.contains("(1/3) Missing byte headers - progress NA: http://example.com/nolen"));
    }

    #[test]
    fn timeout_banner_closes_item() {
        let mut d = display(BarStyle::Bar);
        d.reset(10_000, "http://example.com/slow");
        d.update(10);
        d.timeout();
        d.finish();
        let text = output(d);
        assert!(text.contains("CONNECTION TIMEOUT"));
        assert!(!text.contains("Download Incomplete"));
    }
}
