//! Output formatting and persistence for analysis results.
//!
//! Supports pretty JSON on stdout, one-record CSV reports written under a
//! numbered name, and SVG charts.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::AnalysisError;

/// Upper bound on `output_{i}_...` names tried before giving up.
pub const MAX_SUFFIX_ATTEMPTS: usize = 1000;

/// Prints a value to stdout as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Name of the `i`-th candidate output file for `stem`.
pub fn numbered_name(stem: &str, i: usize) -> String {
    format!("output_{i}_{stem}.csv")
}

/// Writes `record` as a headered one-row CSV to `dir/output_{i}_{stem}.csv`.
///
/// Starts at `i = 1`. A `PermissionDenied` on open moves on to the next `i`;
/// any other error is returned. Returns the path actually written.
pub fn write_csv_with_retry(dir: &Path, stem: &str, record: &impl Serialize) -> Result<PathBuf> {
    write_with_retry(dir, stem, record, |p| File::create(p))
}

fn write_with_retry<W, F>(dir: &Path, stem: &str, record: &impl Serialize, mut open: F) -> Result<PathBuf>
where
    W: Write,
    F: FnMut(&Path) -> io::Result<W>,
{
    for i in 1..=MAX_SUFFIX_ATTEMPTS {
        let path = dir.join(numbered_name(stem, i));

        let file = match open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                warn!(path = %path.display(), "Permission denied, trying next name");
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("creating {}", path.display()));
            }
        };

        debug!(path = %path.display(), "Writing CSV record");
        let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        info!(path = %path.display(), "Report written");
        return Ok(path);
    }

    Err(AnalysisError::SuffixExhausted(MAX_SUFFIX_ATTEMPTS).into())
}

/// Writes an SVG document to `dir/name`.
pub fn save_svg(dir: &Path, name: &str, svg: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, svg).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "Chart saved");
    Ok(path)
}
