//! Failure outcomes of a single fetch.

use thiserror::Error;

/// Why one URL did not end up as a complete staged file.
///
/// Every variant is recoverable: the URL is recorded as failed and the run moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, TLS or transport failure before or during the transfer.
    #[error("unreachable: {0}")]
    Unreachable(#[source] curl::Error),
    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// The staged file size differs from the declared `Content-Length`.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
    /// Throughput dropped to zero mid-stream.
    #[error("connection stalled")]
    Stalled,
    /// Writing the staged file failed.
    #[error("staging write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Network-level failure (the URL could not be reached or the transfer broke off).
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Unreachable(_))
    }
}
