//! Single-URL HTTP GET into a staging file.
//!
//! Uses the curl crate (libcurl) for the transfer. Header lines and body blocks
//! are handed to a receiver that picks the adaptive streaming path or the
//! whole-body path from `Accept-Ranges` / `Content-Length`. A fetch never
//! panics or propagates a transport fault: every outcome is a [`FetchError`]
//! variant or [`FetchStats`].

mod error;
mod headers;
mod receiver;

pub use error::FetchError;
pub use headers::ResponseHead;
pub use receiver::{FetchStats, Strategy};

use receiver::Receiver;
use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::progress::ProgressSink;
use crate::rate::{RateSource, RateTracker};

/// Downloads one URL to one file.
pub trait Fetch {
    /// GET `url` and write the body to `dest`, reporting to `progress`.
    fn fetch(
        &mut self,
        url: &str,
        dest: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<FetchStats, FetchError>;
}

/// curl-backed fetcher with an adaptive chunk size driven by `R`.
pub struct Fetcher<R: RateSource = RateTracker> {
    config: FetchConfig,
    rate: R,
}

impl Fetcher<RateTracker> {
    pub fn new(config: FetchConfig) -> Self {
        let rate = RateTracker::new(config.rate_window);
        Self { config, rate }
    }
}

impl<R: RateSource> Fetcher<R> {
    /// Fetcher whose chunk-size decisions come from a caller-supplied rate source.
    pub fn with_rate_source(config: FetchConfig, rate: R) -> Self {
        Self { config, rate }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn easy(&self, url: &str) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(Duration::from_secs(self.config.connect_timeout_secs))?;
        // A transfer that stays under the speed floor this long is treated as stalled.
        easy.low_speed_limit(self.config.low_speed_limit_bytes)?;
        easy.low_speed_time(Duration::from_secs(self.config.low_speed_time_secs))?;
        Ok(easy)
    }
}

impl<R: RateSource> Fetch for Fetcher<R> {
    fn fetch(
        &mut self,
        url: &str,
        dest: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<FetchStats, FetchError> {
        let mut easy = self.easy(url).map_err(FetchError::Unreachable)?;
        let receiver = RefCell::new(Receiver::new(
            url,
            dest,
            &self.config,
            &mut self.rate,
            progress,
        ));

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    receiver.borrow_mut().on_header(data);
                    true
                })
                .map_err(FetchError::Unreachable)?;
            transfer
                .write_function(|data| {
                    if receiver.borrow_mut().on_data(data) {
                        Ok(data.len())
                    } else {
                        // Short count makes curl abort the transfer.
                        Ok(0)
                    }
                })
                .map_err(FetchError::Unreachable)?;
            transfer.perform()
        };

        let result = receiver.into_inner().finish(performed);
        match &result {
            Ok(stats) => tracing::debug!(
                url,
                bytes = stats.bytes,
                strategy = ?stats.strategy,
                "fetch complete"
            ),
            Err(e) => tracing::warn!(url, error = %e, "fetch failed"),
        }
        result
    }
}
