//! Text helpers for the progress display: byte and time units, centring, URL truncation.

/// Decimal byte units, e.g. `1.50MB`. With `pad`, the number is right-aligned to 6 columns.
pub fn byte_unit(n: f64, pad: bool) -> String {
    let (val, unit) = if n >= 1e9 {
        (n / 1e9, "GB")
    } else if n >= 1e6 {
        (n / 1e6, "MB")
    } else {
        (n / 1e3, "KB")
    };
    if pad {
        format!("{:>6.2}{}", val, unit)
    } else {
        format!("{:.2}{}", val, unit)
    }
}

/// Elapsed time in sec/min/hrs with two decimals.
pub fn time_unit(secs: f64) -> String {
    if secs >= 3600.0 {
        format!("{:.2}hrs", secs / 3600.0)
    } else if secs >= 60.0 {
        format!("{:.2}min", secs / 60.0)
    } else {
        format!("{:.2}sec", secs)
    }
}

/// Centre `text` in `width` columns using `fill` on both sides (extra fill goes right).
pub fn center(text: &str, width: usize, fill: char) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let total = width - len;
    let left = total / 2;
    let right = total - left;
    let mut out = String::with_capacity(width);
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(text);
    out.extend(std::iter::repeat(fill).take(right));
    out
}

/// Fit `url` into `space` columns, keeping its tail behind a leading `...`.
pub fn truncate_url(url: &str, space: usize) -> String {
    let chars: Vec<char> = url.chars().collect();
    if chars.len() < space {
        return url.to_string();
    }
    let keep = space.saturating_sub(4);
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("...{}", tail)
}

/// Pad `text` with spaces to `width` columns (no-op if already wider).
pub fn pad_right(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}
