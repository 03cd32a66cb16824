// crates/communes-core/src/writer.rs

//! # Dataset Writer
//!
//! Deterministic JSON output: two-space indentation, stable key order,
//! non-ASCII kept as-is, trailing newline. Every file is written to a
//! sibling `*.tmp` and renamed into place, so a reader never sees a
//! partial file.

use crate::dedup::sort_compact;
use crate::error::Result;
use crate::model::{sort_records, CityRecord, CompactRecord};
use crate::token::DepartmentToken;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Serializes `value` and atomically replaces `path` with it.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut json = serde_json::to_vec_pretty(value)?;
    json.push(b'\n');

    let tmp = tmp_path(path);
    if let Err(e) = fs::write(&tmp, &json).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Sorts `records` and writes them to `<dir>/cities_<TOKEN>.json`.
/// Returns the path written.
pub fn write_department(
    dir: &Path,
    token: &DepartmentToken,
    mut records: Vec<CityRecord>,
) -> Result<PathBuf> {
    sort_records(&mut records);
    let path = dir.join(token.file_name());
    write_json_atomic(&path, &records)?;
    tracing::info!(path = %path.display(), records = records.len(), "wrote department file");
    Ok(path)
}

/// Writes the cross-department compact listing.
pub fn write_compact(path: &Path, mut records: Vec<CompactRecord>) -> Result<()> {
    sort_compact(&mut records);
    write_json_atomic(path, &records)?;
    tracing::info!(path = %path.display(), entries = records.len(), "wrote compact listing");
    Ok(())
}
