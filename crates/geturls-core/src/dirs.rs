//! Destination directory checks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Ensure `path` is a directory, creating it (and missing parents) if absent.
///
/// Returns `Ok(false)` when `path` exists but is not a directory. Calling it
/// again on the same path is a no-op that returns `Ok(true)`.
pub fn confirm_directory(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path)?;
            tracing::debug!(path = %path.display(), "created directory");
            Ok(true)
        }
        Err(e) => Err(e),
    }
}

/// Absolute destination root for a run.
///
/// Relative paths are taken against the current directory. A path that exists
/// as something other than a directory falls back to the current directory.
pub fn validate_directory(path: &Path) -> io::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    if confirm_directory(&absolute)? {
        Ok(absolute)
    } else {
        tracing::warn!(
            path = %absolute.display(),
            "destination is not a directory, using current directory"
        );
        Ok(cwd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_creates_once_and_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("a").join("b");
        assert!(confirm_directory(&target).unwrap());
        assert!(target.is_dir());
        fs::write(target.join("keep"), b"x").unwrap();
        assert!(confirm_directory(&target).unwrap());
        // second call did not recreate anything
        assert!(target.join("keep").exists());
    }

    #[test]
    fn confirm_rejects_plain_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("file");
        fs::write(&file, b"x").unwrap();
        assert!(!confirm_directory(&file).unwrap());
        assert!(file.is_file());
    }

    #[test]
    fn validate_keeps_absolute_dir() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("dest");
        assert_eq!(validate_directory(&target).unwrap(), target);
        assert!(target.is_dir());
    }

    #[test]
    fn validate_falls_back_on_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("file");
        fs::write(&file, b"x").unwrap();
        assert_eq!(
            validate_directory(&file).unwrap(),
            std::env::current_dir().unwrap()
        );
    }
}
