//! Parse HTTP response header lines into the fields that pick a download strategy.

/// Status and byte headers of the final response (after redirects).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    /// Status code from the last status line seen, if any.
    pub status: Option<u32>,
    /// `Content-Length`, only when it is a plain run of ASCII digits.
    pub content_length: Option<u64>,
    /// True if the server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
}

impl ResponseHead {
    /// Length to stream against, when both byte headers are usable.
    pub fn streamable_length(&self) -> Option<u64> {
        if self.accept_ranges {
            self.content_length
        } else {
            None
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299) | None)
    }
}

/// Parse collected header lines into a [`ResponseHead`].
///
/// Lines from earlier responses in a redirect chain are discarded: every status
/// line (`HTTP/1.1 301 ...`) starts a fresh head.
pub(crate) fn parse_headers(lines: &[String]) -> ResponseHead {
    let mut head = ResponseHead::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            head = ResponseHead {
                status: parse_status_line(line),
                ..ResponseHead::default()
            };
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                head.content_length = parse_length(value);
            }
            if name.eq_ignore_ascii_case("accept-ranges") {
                head.accept_ranges = value.eq_ignore_ascii_case("bytes");
            }
        }
    }

    head
}

fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}

/// Non-negative integer made only of ASCII digits (`+12`, `-1`, `12 ` with junk are rejected).
fn parse_length(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
