//! Filename handling: sanitizing names taken from URLs and resolving collisions.

mod resolve;
pub mod sanitize;

pub use resolve::{file_type, resolve_name, split_name, NameCache};
pub use sanitize::sanitize_filename;
