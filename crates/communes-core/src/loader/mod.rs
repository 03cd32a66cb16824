// crates/communes-core/src/loader/mod.rs

//! # Dataset Loader
//!
//! Handles the physical layer (I/O, decompression, text decoding) and
//! delegates to the CSV or JSON parser. Both parsers map every known
//! column/key spelling onto [`RawRecord`] right here, so nothing downstream
//! ever sees an alias.

use crate::config::CsvOptions;
use crate::error::Result;
use crate::model::CityRecord;
use std::path::Path;

pub mod builder;
pub mod common_io;
mod csv_source;
mod json_source;

pub use csv_source::{load_csv, resolve_columns, ColumnMap};
pub use json_source::{load_json, raw_from_value, JsonDocument};

/// What kind of file a source is, with its reading options.
#[derive(Debug, Clone)]
pub enum SourceKind {
    Csv(CsvOptions),
    Json,
}

impl SourceKind {
    /// Picks JSON for `*.json` / `*.json.gz`, CSV (with `csv`) otherwise.
    pub fn from_path(path: &Path, csv: CsvOptions) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name.ends_with(".json") || name.ends_with(".json.gz") {
            SourceKind::Json
        } else {
            SourceKind::Csv(csv)
        }
    }
}

/// A source row after alias resolution. Every field is trimmed; blank
/// values become `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub name: Option<String>,
    pub postal_code: Option<String>,
    pub department: Option<String>,
    pub insee: Option<String>,
    pub region: Option<String>,
}

impl RawRecord {
    /// Converts to a [`CityRecord`], using empty strings for missing fields
    /// so the validator can report them.
    pub fn into_city_record(self) -> CityRecord {
        CityRecord {
            name: self.name.unwrap_or_default(),
            postal_code: self.postal_code.unwrap_or_default(),
            department: self.department.unwrap_or_default(),
            region: self.region.unwrap_or_default(),
        }
    }
}

pub(crate) fn clean(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty()).then(|| v.to_string())
}

/// Loads any supported source into normalized records.
///
/// A CSV source missing a required column fails with
/// [`CommuneError::SchemaMismatch`](crate::error::CommuneError::SchemaMismatch).
/// An empty or unrecognized JSON document yields no records.
pub fn load(path: &Path, kind: &SourceKind) -> Result<Vec<RawRecord>> {
    match kind {
        SourceKind::Csv(opts) => load_csv(path, opts),
        SourceKind::Json => load_json(path),
    }
}

/// Loads a `cities_<TOKEN>.json` file as city records, one per entry.
///
/// Entries that are not JSON objects come back as all-empty records, so they
/// keep their position and show up as invalid instead of vanishing.
pub fn load_city_file(path: &Path) -> Result<Vec<CityRecord>> {
    let doc = JsonDocument::read(path)?;
    Ok(doc
        .entries
        .iter()
        .map(|v| raw_from_value(v).unwrap_or_default().into_city_record())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_kind_from_extension() {
        let csv = CsvOptions::default();
        assert!(matches!(
            SourceKind::from_path(Path::new("cities_69.json"), csv.clone()),
            SourceKind::Json
        ));
        assert!(matches!(
            SourceKind::from_path(Path::new("dump.JSON.gz"), csv.clone()),
            SourceKind::Json
        ));
        assert!(matches!(
            SourceKind::from_path(Path::new("base-officielle-codes-postaux.csv"), csv),
            SourceKind::Csv(_)
        ));
    }

    #[test]
    fn missing_fields_become_empty() {
        let raw = RawRecord {
            name: Some("Lyon".into()),
            ..RawRecord::default()
        };
        let r = raw.into_city_record();
        assert_eq!(r.name, "Lyon");
        assert_eq!(r.postal_code, "");
        assert_eq!(r.department, "");
    }

    #[test]
    fn empty_sources_yield_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("cities_69.json");
        std::fs::write(&json, b"").unwrap();
        assert!(load(&json, &SourceKind::Json).unwrap().is_empty());
        assert!(load_city_file(&json).unwrap().is_empty());

        let csv = dir.path().join("base.csv");
        std::fs::write(&csv, b"  \n\n").unwrap();
        let kind = SourceKind::Csv(CsvOptions::default());
        assert!(load(&csv, &kind).unwrap().is_empty());
    }

    #[test]
    fn json_source_reads_wrapped_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities_74.json");
        std::fs::write(&path, r#"{"data": [{"name": "Annecy", "cp": 74000, "dept": "74"}]}"#).unwrap();

        let rows = load(&path, &SourceKind::Json).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].postal_code.as_deref(), Some("74000"));
    }

    #[cfg(feature = "compact")]
    #[test]
    fn reads_gzip_compressed_csv() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.csv.gz");
        let mut enc = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        enc.write_all(b"#Code_commune_INSEE;Nom_de_la_commune;Code_postal\n69123;Lyon;69001\n")
            .unwrap();
        enc.finish().unwrap();

        let rows = load(&path, &SourceKind::Csv(CsvOptions::default())).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name.as_deref(), Some("Lyon"));
        assert_eq!(rows[0].insee.as_deref(), Some("69123"));
    }
}
