//! CLI command handlers.

mod collect;
mod download;

pub use collect::{collect_urls, print_urls};
pub use download::run_download;
