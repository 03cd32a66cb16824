// crates/communes-core/src/model.rs
use crate::token::DepartmentToken;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One commune entry as stored in `cities_<TOKEN>.json`.
///
/// Field order here is the key order on disk: `name`, `cp`, `dept`, `region`.
/// `dept` stays a plain string because files on disk may carry values the
/// validator has to report on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRecord {
    pub name: String,
    #[serde(rename = "cp")]
    pub postal_code: String,
    #[serde(rename = "dept")]
    pub department: String,
    #[serde(default)]
    pub region: String,
}

impl CityRecord {
    pub fn new(name: impl Into<String>, postal_code: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            postal_code: postal_code.into(),
            department: department.into(),
            region: String::new(),
        }
    }
}

/// Sorts records into the canonical on-disk order: name (case-insensitive),
/// then postal code.
pub fn sort_records(records: &mut [CityRecord]) {
    records.sort_by_cached_key(|r| (r.name.to_lowercase(), r.postal_code.clone()));
}

/// One entry of `cities_compact.json`: every postal code known for a
/// commune name within a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactRecord {
    pub name: String,
    pub dept: String,
    /// Sorted, never empty.
    pub cps: Vec<String>,
}

impl CompactRecord {
    /// Smallest postal code, used as the last sort key.
    pub fn first_cp(&self) -> &str {
        self.cps.first().map(String::as_str).unwrap_or("")
    }
}

/// Per-department grouping of records, owned by the caller while a build runs.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    departments: BTreeMap<DepartmentToken, Vec<CityRecord>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: DepartmentToken, record: CityRecord) {
        self.departments.entry(token).or_default().push(record);
    }

    pub fn tokens(&self) -> impl Iterator<Item = &DepartmentToken> {
        self.departments.keys()
    }

    pub fn get(&self, token: &DepartmentToken) -> Option<&[CityRecord]> {
        self.departments.get(token).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.departments.values().map(Vec::len).sum()
    }

    /// Keeps only the listed departments.
    pub fn retain_tokens(&mut self, keep: &BTreeSet<DepartmentToken>) {
        self.departments.retain(|t, _| keep.contains(t));
    }
}

impl IntoIterator for Dataset {
    type Item = (DepartmentToken, Vec<CityRecord>);
    type IntoIter = std::collections::btree_map::IntoIter<DepartmentToken, Vec<CityRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.departments.into_iter()
    }
}
