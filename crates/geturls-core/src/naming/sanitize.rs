//! Filename cleanup for names taken from URLs.

/// Name used when a URL path ends in nothing usable.
pub const FALLBACK_NAME: &str = "download.bin";

/// Makes a decoded URL filename safe to create on Linux.
///
/// - Replaces NUL, `/`, `\` and control characters with `_`
/// - Maps empty, `.` and `..` to [`FALLBACK_NAME`]
/// - Limits length to 255 bytes (Linux NAME_MAX), on a char boundary
pub fn sanitize_filename(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let cleaned: String = name
        .chars()
        .map(|c| {
            if c == '\0' || c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return FALLBACK_NAME.to_string();
    }

    if cleaned.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !cleaned.is_char_boundary(take) {
            take -= 1;
        }
        cleaned[..take].to_string()
    } else {
        cleaned
    }
}
