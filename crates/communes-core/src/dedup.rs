// crates/communes-core/src/dedup.rs

//! # Deduplicator
//!
//! Two variants, both idempotent:
//!
//! - **identity**: one record per (name case-folded, postal code), first
//!   occurrence kept, relative order preserved;
//! - **compact**: one entry per (department, name lower-cased) carrying every
//!   postal code seen for it.

use crate::model::{CityRecord, CompactRecord};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Result of an identity dedup pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupOutcome<T> {
    pub kept: Vec<T>,
    pub removed: usize,
}

/// Identity key: trimmed, case-folded name and trimmed postal code.
///
/// Names are upper-cased then lower-cased, so any two names equal in either
/// case collapse (`K` and U+212A KELVIN SIGN both fold to `k`).
pub fn identity_key(name: &str, postal_code: &str) -> (String, String) {
    (name.trim().to_uppercase().to_lowercase(), postal_code.trim().to_string())
}

/// Keeps the first item for every distinct key, preserving order.
pub fn dedup_by_key<T, K, F>(items: Vec<T>, mut key: F) -> DedupOutcome<T>
where
    K: Eq + std::hash::Hash,
    F: FnMut(&T) -> K,
{
    let before = items.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<T> = items.into_iter().filter(|it| seen.insert(key(it))).collect();
    DedupOutcome {
        removed: before - kept.len(),
        kept,
    }
}

/// Identity dedup over city records.
///
/// ```rust
/// use communes_core::dedup::dedup_identity;
/// use communes_core::model::CityRecord;
///
/// let out = dedup_identity(vec![
///     CityRecord::new("Lyon", "69001", "69"),
///     CityRecord::new("LYON", "69001", "69"),
/// ]);
/// assert_eq!(out.kept.len(), 1);
/// assert_eq!(out.kept[0].name, "Lyon");
/// assert_eq!(out.removed, 1);
/// ```
pub fn dedup_identity(records: Vec<CityRecord>) -> DedupOutcome<CityRecord> {
    dedup_by_key(records, |r| identity_key(&r.name, &r.postal_code))
}

// -----------------------------------------------------------------------------
// COMPACT
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Bucket {
    name: String,
    dept: String,
    cps: BTreeSet<String>,
}

/// Caller-owned accumulator for the compact listing.
///
/// Feed it records from any number of files with [`add`](Self::add), then
/// call [`finish`](Self::finish).
#[derive(Debug, Clone, Default)]
pub struct CompactAccumulator {
    buckets: HashMap<(String, String), Bucket>,
    skipped: usize,
}

impl CompactAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record. Records with an empty name, postal code or department
    /// are skipped and counted. Returns whether the record was taken.
    pub fn add(&mut self, record: &CityRecord) -> bool {
        let name = record.name.trim();
        let cp = record.postal_code.trim();
        let dept = record.department.trim();
        if name.is_empty() || cp.is_empty() || dept.is_empty() {
            self.skipped += 1;
            return false;
        }

        let bucket = self
            .buckets
            .entry((dept.to_string(), name.to_lowercase()))
            .or_insert_with(|| Bucket {
                name: name.to_string(),
                dept: dept.to_string(),
                cps: BTreeSet::new(),
            });
        bucket.cps.insert(cp.to_string());
        true
    }

    pub fn extend<'a>(&mut self, records: impl IntoIterator<Item = &'a CityRecord>) {
        for r in records {
            self.add(r);
        }
    }

    /// Number of distinct (department, name) groups so far.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Sorted compact listing: name (lower-case), department, first cp.
    pub fn finish(self) -> Vec<CompactRecord> {
        let mut out: Vec<CompactRecord> = self
            .buckets
            .into_values()
            .map(|b| CompactRecord {
                name: b.name,
                dept: b.dept,
                cps: b.cps.into_iter().collect(),
            })
            .collect();
        sort_compact(&mut out);
        out
    }
}

pub fn sort_compact(records: &mut [CompactRecord]) {
    records.sort_by_cached_key(|r| (r.name.to_lowercase(), r.dept.clone(), r.first_cp().to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, cp: &str, dept: &str) -> CityRecord {
        CityRecord::new(name, cp, dept)
    }

    fn sample() -> Vec<CityRecord> {
        vec![
            rec("Lyon", "69001", "69"),
            rec("Bron", "69500", "69"),
            rec("LYON", "69001", "69"),
            rec("Lyon", "69002", "69"),
            rec(" lyon ", "69001 ", "69"),
            rec("Bron", "69500", "69"),
        ]
    }

    #[test]
    fn identity_keeps_first_occurrence_in_order() {
        let out = dedup_identity(sample());
        let got: Vec<_> = out.kept.iter().map(|r| (r.name.as_str(), r.postal_code.as_str())).collect();
        assert_eq!(got, [("Lyon", "69001"), ("Bron", "69500"), ("Lyon", "69002")]);
        assert_eq!(out.removed, 3);
    }

    #[test]
    fn identity_is_idempotent() {
        let once = dedup_identity(sample());
        let twice = dedup_identity(once.kept.clone());
        assert_eq!(twice.kept, once.kept);
        assert_eq!(twice.removed, 0);
    }

    #[test]
    fn identity_folds_names_equal_in_lower_case() {
        let out = dedup_identity(vec![rec("Kerlaz", "29100", "29"), rec("\u{212A}erlaz", "29100", "29")]);
        assert_eq!(out.kept.len(), 1);
        assert_eq!(out.kept[0].name, "Kerlaz");
        assert_eq!(out.removed, 1);
    }

    #[test]
    fn identity_only_drops_exact_duplicates() {
        let input = vec![rec("Lyon", "69001", "69"), rec("Lyon", "69003", "69"), rec("Lyons", "69001", "69")];
        let out = dedup_identity(input.clone());
        assert_eq!(out.kept, input);
    }

    #[test]
    fn compact_unions_postal_codes_per_name_and_department() {
        let mut acc = CompactAccumulator::new();
        acc.extend(&[
            rec("Lyon", "69003", "69"),
            rec("LYON", "69001", "69"),
            rec("Lyon", "69001", "69"),
            rec("Saint-Denis", "97400", "974"),
            rec("Saint-Denis", "93200", "93"),
            rec("", "93200", "93"),
        ]);
        assert_eq!(acc.skipped(), 1);
        assert_eq!(acc.len(), 3);

        let out = acc.finish();
        assert_eq!(
            out,
            vec![
                CompactRecord { name: "Lyon".into(), dept: "69".into(), cps: vec!["69001".into(), "69003".into()] },
                CompactRecord { name: "Saint-Denis".into(), dept: "93".into(), cps: vec!["93200".into()] },
                CompactRecord { name: "Saint-Denis".into(), dept: "974".into(), cps: vec!["97400".into()] },
            ]
        );
    }

    #[test]
    fn compact_is_idempotent_over_its_own_output() {
        let mut acc = CompactAccumulator::new();
        acc.extend(&sample());
        let first = acc.finish();

        let mut again = CompactAccumulator::new();
        for c in &first {
            for cp in &c.cps {
                again.add(&rec(&c.name, cp, &c.dept));
            }
        }
        assert_eq!(again.finish(), first);
    }
}
