//! Move a staged file to its final path.

use std::fs;
use std::io;
use std::path::Path;

/// Rename `from` to `to`. When the two sit on different filesystems, copy and
/// then remove the source instead.
pub(crate) fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if crosses_devices(&e) => {
            tracing::debug!(
                from = %from.display(),
                to = %to.display(),
                "rename across filesystems, copying"
            );
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn crosses_devices(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(not(unix))]
fn crosses_devices(_e: &io::Error) -> bool {
    false
}
