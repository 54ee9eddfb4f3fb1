//! Directory trees mirroring a URL's host and path.

use std::path::{Component, Path, PathBuf};

/// Relative tree for a source directory: scheme, query and fragment dropped,
/// one component per non-empty path segment.
///
/// `http://example.com:8080/a/b` -> `example.com:8080/a/b`. Segments that would
/// step outside the destination (`.`, `..`) are skipped, so the tree always stays
/// under the root it is joined to.
pub fn host_tree(source_dir: &str) -> PathBuf {
    let without_scheme = source_dir
        .split_once("://")
        .map_or(source_dir, |(_, rest)| rest);
    let end = without_scheme
        .find(|c: char| c == '?' || c == '#')
        .unwrap_or(without_scheme.len());

    without_scheme[..end]
        .split('/')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| {
            matches!(
                Path::new(segment).components().next(),
                Some(Component::Normal(_))
            ) && !segment.contains('\\')
        })
        .collect()
}
