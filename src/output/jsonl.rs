//! JSON Lines export
//!
//! Chunks and failure records are written one JSON object per line, the
//! format the indexing side reads.

use crate::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `items` to `path`, one JSON object per line
///
/// Parent directories are created as needed; an existing file is replaced.
/// Returns the number of lines written.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} line(s) to {}", items.len(), path.display());
    Ok(items.len())
}
