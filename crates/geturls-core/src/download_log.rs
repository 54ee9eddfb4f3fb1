//! CSV log of placed downloads: `date,time,url,path`, one row per file.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::placement::LogRecord;

/// Append `records` to the CSV file at `path`, creating it if needed.
///
/// Existing rows are never rewritten. An empty slice does not touch the file.
pub fn append_log(path: &Path, records: &[LogRecord]) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    let mut rows = String::new();
    for record in records {
        let final_path = record.final_path.to_string_lossy();
        let fields = [
            record.date.as_str(),
            record.time.as_str(),
            record.url.as_str(),
            final_path.as_ref(),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        rows.push_str(&row.join(","));
        rows.push('\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open download log {}", path.display()))?;
    file.write_all(rows.as_bytes())
        .with_context(|| format!("write download log {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = records.len(), "download log appended");
    Ok(())
}

/// Quote a field when it holds a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
