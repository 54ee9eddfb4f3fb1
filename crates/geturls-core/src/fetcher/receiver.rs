//! Response receiver: picks the download strategy from the headers and writes the body.
//!
//! curl pushes header lines and body blocks into a [`Receiver`]. On the first body
//! block (or at the end of an empty response) the receiver inspects the headers:
//! with `Accept-Ranges: bytes` and a valid `Content-Length` it streams to disk in
//! adaptively sized chunks, otherwise it buffers the whole body and writes it in
//! one call.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use super::error::FetchError;
use super::headers::{parse_headers, ResponseHead};
use crate::config::FetchConfig;
use crate::progress::ProgressSink;
use crate::rate::RateSource;

/// How a download was written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Chunked writes against a declared length, with progress and rate.
    Streamed,
    /// One write of the whole body; no progress tracking.
    WholeBody,
}

/// Outcome of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchStats {
    pub bytes: u64,
    pub strategy: Strategy,
    pub elapsed: Duration,
    /// Smoothed rate at the end of a streamed download; `None` for whole-body downloads.
    pub rate: Option<f64>,
    /// Chunk size in use when a streamed download finished.
    pub final_chunk_bytes: Option<usize>,
}

/// What the chunk loop should do after a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Checkpoint {
    Continue,
    Stall,
}

/// Adaptive read size: re-evaluated every `checkpoint_interval` reads against the current rate.
#[derive(Debug, Clone)]
pub(crate) struct ChunkSizer {
    chunk: usize,
    min: usize,
    max: usize,
    interval: u64,
    shrink_below: f64,
    grow_above: f64,
    reads: u64,
}

impl ChunkSizer {
    pub(crate) fn new(config: &FetchConfig) -> Self {
        let min = config.min_chunk_bytes.max(1);
        let max = config.max_chunk_bytes.max(min);
        Self {
            chunk: config.initial_chunk_bytes.clamp(min, max),
            min,
            max,
            interval: config.checkpoint_interval.max(1),
            shrink_below: config.shrink_below,
            grow_above: config.grow_above,
            reads: 0,
        }
    }

    pub(crate) fn chunk(&self) -> usize {
        self.chunk
    }

    /// Size of the next read, clamped so it never runs past the declared total.
    fn next_len(&self, remaining: u64) -> usize {
        remaining.min(self.chunk as u64) as usize
    }

    /// Count one read; at a checkpoint, resize against `rate` or report a stall.
    pub(crate) fn after_read(&mut self, rate: f64) -> Checkpoint {
        self.reads += 1;
        if self.reads % self.interval != 0 {
            return Checkpoint::Continue;
        }
        if rate <= 0.0 {
            return Checkpoint::Stall;
        }
        let ratio = rate / self.chunk as f64;
        let previous = self.chunk;
        if ratio < self.shrink_below {
            self.chunk = (self.chunk / 2).max(self.min);
        } else if ratio > self.grow_above {
            self.chunk = self.chunk.saturating_mul(2).min(self.max);
        }
        if previous != self.chunk {
            tracing::debug!(rate, from = previous, to = self.chunk, "chunk size adjusted");
        }
        Checkpoint::Continue
    }
}

/// Streamed body: bytes wait in `pending` until a full chunk (or the tail) is available.
struct Stream {
    file: File,
    total: u64,
    written: u64,
    pending: Vec<u8>,
    sizer: ChunkSizer,
}

enum Body {
    Streaming(Stream),
    Whole(Vec<u8>),
}

pub(crate) struct Receiver<'a, R: RateSource> {
    url: &'a str,
    dest: &'a Path,
    config: &'a FetchConfig,
    rate: &'a mut R,
    progress: &'a mut dyn ProgressSink,
    started: Instant,
    header_lines: Vec<String>,
    /// Chosen on the first body block; `None` until then.
    body: Option<Body>,
    error: Option<FetchError>,
}

impl<'a, R: RateSource> Receiver<'a, R> {
    pub(crate) fn new(
        url: &'a str,
        dest: &'a Path,
        config: &'a FetchConfig,
        rate: &'a mut R,
        progress: &'a mut dyn ProgressSink,
    ) -> Self {
        Self {
            url,
            dest,
            config,
            rate,
            progress,
            started: Instant::now(),
            header_lines: Vec::new(),
            body: None,
            error: None,
        }
    }

    /// One raw header line from curl (status lines included).
    pub(crate) fn on_header(&mut self, data: &[u8]) {
        let line = String::from_utf8_lossy(data);
        self.header_lines.push(line.trim_end().to_string());
    }

    /// One body block from curl. Returns false to abort the transfer.
    pub(crate) fn on_data(&mut self, data: &[u8]) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.receive(data) {
            Ok(()) => true,
            Err(e) => {
                self.error = Some(e);
                false
            }
        }
    }

    fn receive(&mut self, data: &[u8]) -> Result<(), FetchError> {
        if self.body.is_none() {
            self.body = Some(self.begin()?);
        }
        match &mut self.body {
            Some(Body::Streaming(stream)) => {
                let room = stream.total - stream.written - stream.pending.len() as u64;
                let take = (data.len() as u64).min(room) as usize;
                stream.pending.extend_from_slice(&data[..take]);
                drain(stream, false, &mut *self.rate, &mut *self.progress)
            }
            Some(Body::Whole(buf)) => {
                buf.extend_from_slice(data);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Choose the strategy from the headers collected so far.
    fn begin(&mut self) -> Result<Body, FetchError> {
        let head: ResponseHead = parse_headers(&self.header_lines);
        if !head.is_success() {
            return Err(FetchError::Http(head.status.unwrap_or(0)));
        }
        let body = match head.streamable_length() {
            Some(total) => {
                self.progress.reset(total, self.url);
                let file = File::create(self.dest)?;
                self.rate.reset(Instant::now());
                tracing::debug!(url = self.url, total, "streaming download");
                Body::Streaming(Stream {
                    file,
                    total,
                    written: 0,
                    pending: Vec::new(),
                    sizer: ChunkSizer::new(self.config),
                })
            }
            None => {
                self.progress.no_byte_headers(self.url);
                tracing::debug!(url = self.url, "no byte headers, whole-body download");
                Body::Whole(Vec::new())
            }
        };
        Ok(body)
    }

    /// Settle the transfer once curl returns.
    pub(crate) fn finish(
        mut self,
        performed: Result<(), curl::Error>,
    ) -> Result<FetchStats, FetchError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        if let Err(e) = performed {
            let streaming = matches!(self.body, Some(Body::Streaming(_)));
            if streaming && e.is_operation_timedout() {
                self.progress.timeout();
                return Err(FetchError::Stalled);
            }
            return Err(FetchError::Unreachable(e));
        }
        let body = match self.body.take() {
            Some(body) => body,
            None => self.begin()?,
        };

        let elapsed_from = self.started;
        match body {
            Body::Streaming(mut stream) => {
                drain(&mut stream, true, &mut *self.rate, &mut *self.progress)?;
                stream.file.flush()?;
                let Stream {
                    file, total, sizer, ..
                } = stream;
                drop(file);

                let actual = fs::metadata(self.dest)?.len();
                if actual != total {
                    let _ = fs::remove_file(self.dest);
                    return Err(FetchError::SizeMismatch {
                        expected: total,
                        actual,
                    });
                }
                Ok(FetchStats {
                    bytes: actual,
                    strategy: Strategy::Streamed,
                    elapsed: elapsed_from.elapsed(),
                    rate: Some(self.rate.rate()),
                    final_chunk_bytes: Some(sizer.chunk()),
                })
            }
            Body::Whole(buf) => {
                fs::write(self.dest, &buf)?;
                Ok(FetchStats {
                    bytes: buf.len() as u64,
                    strategy: Strategy::WholeBody,
                    elapsed: elapsed_from.elapsed(),
                    rate: None,
                    final_chunk_bytes: None,
                })
            }
        }
    }
}

/// Write full chunks from `pending`; with `tail`, also flush a final short chunk.
fn drain<R: RateSource>(
    stream: &mut Stream,
    tail: bool,
    rate: &mut R,
    progress: &mut dyn ProgressSink,
) -> Result<(), FetchError> {
    loop {
        let remaining = stream.total - stream.written;
        if remaining == 0 || stream.pending.is_empty() {
            return Ok(());
        }
        let mut want = stream.sizer.next_len(remaining);
        if stream.pending.len() < want {
            if !tail {
                return Ok(());
            }
            want = stream.pending.len();
        }

        stream.file.write_all(&stream.pending[..want])?;
        stream.pending.drain(..want);
        stream.written += want as u64;
        progress.update(want as u64);
        let current = rate.record(want as u64, Instant::now());

        if stream.sizer.after_read(current) == Checkpoint::Stall {
            progress.timeout();
            return Err(FetchError::Stalled);
        }
    }
}
