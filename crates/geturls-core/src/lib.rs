pub mod config;
pub mod logging;

pub mod cluster;
pub mod dirs;
pub mod download_log;
pub mod extract;
pub mod fetcher;
pub mod naming;
pub mod pipeline;
pub mod placement;
pub mod progress;
pub mod rate;
pub mod staging;
