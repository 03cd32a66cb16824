// crates/communes-core/src/loader/builder.rs

//! Builds the per-department files from the national postal-code CSV.

use super::{load_csv, RawRecord};
use crate::config::CsvOptions;
use crate::dedup::dedup_identity;
use crate::error::Result;
use crate::model::{CityRecord, Dataset};
use crate::token::{derive_token, DepartmentToken};
use crate::writer::write_department;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

// -----------------------------------------------------------------------------
// CONFIGURATION
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub csv: CsvOptions,
    /// Only write these departments (e.g. `975`, `980`). Empty = all.
    pub tokens: BTreeSet<DepartmentToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub rows_read: usize,
    /// Rows without a usable postal code or name.
    pub rows_skipped: usize,
    /// Rows whose department is not in the requested token list.
    pub rows_filtered: usize,
    pub duplicates_removed: usize,
    pub records_written: usize,
    pub files_written: usize,
    pub tokens: Vec<String>,
    /// Records left under the provisional `"20"` token.
    pub ambiguous_corsica: usize,
}

// -----------------------------------------------------------------------------
// PIPELINE
// -----------------------------------------------------------------------------

/// Tokenizes raw rows into `dataset`. Returns `(skipped, filtered)`.
///
/// `dataset` is owned by the caller so rows from several sources can be
/// grouped together before writing.
pub fn group_rows(
    rows: Vec<RawRecord>,
    tokens: &BTreeSet<DepartmentToken>,
    dataset: &mut Dataset,
) -> (usize, usize) {
    let mut skipped = 0;
    let mut filtered = 0;

    for row in rows {
        let (Some(name), Some(cp)) = (row.name, row.postal_code) else {
            skipped += 1;
            continue;
        };
        let Some(token) = derive_token(&cp, row.insee.as_deref()) else {
            tracing::debug!(%name, %cp, "skipping row with malformed postal code");
            skipped += 1;
            continue;
        };
        if !tokens.is_empty() && !tokens.contains(&token) {
            filtered += 1;
            continue;
        }
        let record = CityRecord {
            name,
            postal_code: cp,
            department: token.to_string(),
            region: String::new(),
        };
        dataset.push(token, record);
    }

    (skipped, filtered)
}

/// Dedups and writes every department of `dataset` into `out_dir`.
pub fn write_dataset(dataset: Dataset, out_dir: &Path, summary: &mut BuildSummary) -> Result<()> {
    for (token, records) in dataset {
        let outcome = dedup_identity(records);
        summary.duplicates_removed += outcome.removed;
        summary.records_written += outcome.kept.len();
        if token.is_ambiguous_corsica() {
            summary.ambiguous_corsica += outcome.kept.len();
            tracing::warn!(
                records = outcome.kept.len(),
                "Corsican records without INSEE code kept under \"20\"; route them to 2A/2B by hand"
            );
        }
        write_department(out_dir, &token, outcome.kept)?;
        summary.files_written += 1;
        summary.tokens.push(token.to_string());
    }
    Ok(())
}

/// CSV → `cities_<TOKEN>.json` for every department found (or requested).
///
/// Fails before writing anything if the CSV lacks a required column.
pub fn build_from_csv(csv_path: &Path, out_dir: &Path, opts: &BuildOptions) -> Result<BuildSummary> {
    tracing::info!(
        "Building {} -> {}",
        csv_path.display(),
        out_dir.display()
    );

    let rows = load_csv(csv_path, &opts.csv)?;
    let mut summary = BuildSummary {
        rows_read: rows.len(),
        ..BuildSummary::default()
    };

    let mut dataset = Dataset::new();
    let (skipped, filtered) = group_rows(rows, &opts.tokens, &mut dataset);
    summary.rows_skipped = skipped;
    summary.rows_filtered = filtered;

    for wanted in &opts.tokens {
        if dataset.get(wanted).is_none() {
            tracing::warn!(token = %wanted, "requested department has no rows in the source");
        }
    }

    write_dataset(dataset, out_dir, &mut summary)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::clean;

    fn row(name: &str, cp: &str, insee: &str) -> RawRecord {
        RawRecord {
            name: clean(name),
            postal_code: clean(cp),
            insee: clean(insee),
            ..RawRecord::default()
        }
    }

    fn t(s: &str) -> DepartmentToken {
        DepartmentToken::parse(s).unwrap()
    }

    #[test]
    fn groups_rows_by_derived_token() {
        let mut ds = Dataset::new();
        let (skipped, filtered) = group_rows(
            vec![
                row("LYON", "69001", "69381"),
                row("AJACCIO", "20000", "2A004"),
                row("ST DENIS", "97400", "97411"),
                row("", "69001", "69381"),
                row("NOWHERE", "123", ""),
            ],
            &BTreeSet::new(),
            &mut ds,
        );
        assert_eq!((skipped, filtered), (2, 0));
        assert_eq!(ds.get(&t("2A")).unwrap()[0].department, "2A");
        assert_eq!(ds.get(&t("974")).unwrap()[0].name, "ST DENIS");
        assert_eq!(ds.record_count(), 3);
    }

    #[test]
    fn honours_token_filter() {
        let mut ds = Dataset::new();
        let keep = BTreeSet::from([t("975"), t("980")]);
        let (_, filtered) = group_rows(
            vec![
                row("ST PIERRE", "97500", "97502"),
                row("MONACO", "98000", "99138"),
                row("LYON", "69001", "69381"),
            ],
            &keep,
            &mut ds,
        );
        assert_eq!(filtered, 1);
        assert_eq!(ds.tokens().map(|t| t.as_str()).collect::<Vec<_>>(), ["975", "980"]);
    }
}
