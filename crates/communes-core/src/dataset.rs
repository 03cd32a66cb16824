// crates/communes-core/src/dataset.rs

//! On-disk layout: one `cities_<TOKEN>.json` per department in a single
//! directory, plus an optional `cities_compact.json` next to them.

use crate::dedup::{dedup_by_key, identity_key, CompactAccumulator};
use crate::error::{CommuneError, Result};
use crate::loader::{load_city_file, raw_from_value, JsonDocument, RawRecord};
use crate::token::DepartmentToken;
use crate::writer::{write_compact, write_json_atomic};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const FILE_PREFIX: &str = "cities_";
pub const FILE_SUFFIX: &str = ".json";

/// A department file found in the dataset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityFile {
    pub path: PathBuf,
    /// `None` for files like `cities_compact.json` whose suffix is not a
    /// department token.
    pub token: Option<DepartmentToken>,
}

impl CityFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Extracts the token from `cities_<TOKEN>.json`.
pub fn token_from_file_name(name: &str) -> Option<DepartmentToken> {
    let inner = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    let shaped = (2..=3).contains(&inner.len()) && inner.bytes().all(|b| b.is_ascii_alphanumeric());
    if !shaped {
        return None;
    }
    DepartmentToken::parse(inner)
}

/// Lists every `cities_*.json` in `dir`, sorted by file name.
pub fn list_city_files(dir: &Path) -> Result<Vec<CityFile>> {
    if !dir.is_dir() {
        return Err(CommuneError::NotFound(format!(
            "dataset directory {} does not exist",
            dir.display()
        )));
    }

    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(FILE_PREFIX) || !name.ends_with(FILE_SUFFIX) {
            continue;
        }
        if !entry.file_type()?.is_file() {
            continue;
        }
        out.push(CityFile {
            token: token_from_file_name(&name),
            path: entry.path(),
        });
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

/// Only the files whose name carries a department token.
pub fn list_department_files(dir: &Path) -> Result<Vec<CityFile>> {
    Ok(list_city_files(dir)?
        .into_iter()
        .filter(|f| f.token.is_some())
        .collect())
}

// -----------------------------------------------------------------------------
// DEDUP IN PLACE
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileDedup {
    pub file: String,
    pub removed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirDedupSummary {
    pub files_processed: usize,
    pub files_failed: Vec<String>,
    pub total_removed: usize,
    pub per_file: Vec<FileDedup>,
}

/// Identity-dedups one file in place. Kept entries are written back exactly
/// as read; the file is only rewritten when something was removed.
pub fn dedup_file(path: &Path) -> Result<usize> {
    let mut doc = JsonDocument::read(path)?;
    let entries = std::mem::take(&mut doc.entries);
    let mut position = 0usize;
    let outcome = dedup_by_key(entries, |v| {
        position += 1;
        match raw_from_value(v) {
            Some(raw) => EntryKey::Identity(identity_entry_key(&raw)),
            None => EntryKey::Opaque(position),
        }
    });
    doc.entries = outcome.kept;
    if outcome.removed > 0 {
        write_json_atomic(path, &doc.into_value())?;
    }
    Ok(outcome.removed)
}

/// Non-object entries are never treated as duplicates of anything.
#[derive(PartialEq, Eq, Hash)]
enum EntryKey {
    Identity((String, String)),
    Opaque(usize),
}

fn identity_entry_key(raw: &RawRecord) -> (String, String) {
    identity_key(
        raw.name.as_deref().unwrap_or(""),
        raw.postal_code.as_deref().unwrap_or(""),
    )
}

/// Runs [`dedup_file`] over every department file in `dir`. A file that
/// cannot be read is logged and listed in `files_failed`; the batch goes on.
pub fn dedup_dir(dir: &Path) -> Result<DirDedupSummary> {
    let mut summary = DirDedupSummary::default();
    for file in list_department_files(dir)? {
        let name = file.file_name();
        match dedup_file(&file.path) {
            Ok(removed) => {
                if removed > 0 {
                    tracing::info!(file = %name, removed, "removed duplicates");
                } else {
                    tracing::debug!(file = %name, "no duplicates");
                }
                summary.files_processed += 1;
                summary.total_removed += removed;
                summary.per_file.push(FileDedup { file: name, removed });
            }
            Err(e) => {
                tracing::warn!(file = %name, "skipping file: {e}");
                summary.files_failed.push(name);
            }
        }
    }
    Ok(summary)
}

// -----------------------------------------------------------------------------
// COMPACT LISTING
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompactSummary {
    pub files_read: usize,
    pub files_failed: Vec<String>,
    pub records_skipped: usize,
    pub entries: usize,
}

/// Builds `out` from every department file in `dir`.
pub fn compact_dir(dir: &Path, out: &Path) -> Result<CompactSummary> {
    let mut summary = CompactSummary::default();
    let mut acc = CompactAccumulator::new();

    for file in list_department_files(dir)? {
        match load_city_file(&file.path) {
            Ok(records) => {
                acc.extend(&records);
                summary.files_read += 1;
            }
            Err(e) => {
                tracing::warn!(file = %file.file_name(), "skipping file: {e}");
                summary.files_failed.push(file.file_name());
            }
        }
    }

    summary.records_skipped = acc.skipped();
    let listing = acc.finish();
    summary.entries = listing.len();
    write_compact(out, listing)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tokens_from_file_names() {
        let t = |n: &str| token_from_file_name(n).map(|t| t.to_string());
        assert_eq!(t("cities_01.json").as_deref(), Some("01"));
        assert_eq!(t("cities_2A.json").as_deref(), Some("2A"));
        assert_eq!(t("cities_2a.json"), None);
        assert_eq!(t("cities_974.json").as_deref(), Some("974"));
        assert_eq!(t("cities_compact.json"), None);
        assert_eq!(t("cities_69.json.tmp"), None);
        assert_eq!(t("towns_69.json"), None);
    }
}
