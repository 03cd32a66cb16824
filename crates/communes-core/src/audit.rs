// crates/communes-core/src/audit.rs

//! # Audit Reporter
//!
//! Read-only checks over a dataset directory. Nothing here writes to disk.

use crate::dataset::list_department_files;
use crate::error::Result;
use crate::loader::load_city_file;
use crate::model::CityRecord;
use crate::token::expected_tokens;
use crate::validate::{validate, Violation};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

/// How many entries the text report shows per ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditOptions {
    pub top_departments: usize,
    pub top_duplicates: usize,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            top_departments: 15,
            top_duplicates: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentVolume {
    pub dept: String,
    pub records: usize,
}

/// A value seen more than once within a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub dept: String,
    pub value: String,
    pub count: usize,
}

/// A record located by file and position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRef {
    pub file: String,
    pub index: usize,
    pub record: CityRecord,
}

/// Failure counts per reason. A record with several reasons counts once in
/// each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViolationCounts {
    pub empty_field: usize,
    pub malformed_postal_code: usize,
    pub department_mismatch: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub dir: String,
    pub files: usize,
    pub records: usize,
    pub invalid_records: usize,
    pub violations: ViolationCounts,
    pub empty_files: Vec<String>,
    pub unreadable_files: Vec<String>,
    pub missing_files: Vec<String>,
    /// Every department, most records first.
    pub department_volumes: Vec<DepartmentVolume>,
    pub name_duplicates: Vec<DuplicateGroup>,
    pub postal_code_duplicates: Vec<DuplicateGroup>,
    /// Records still under the provisional `"20"` token.
    pub ambiguous_corsica: Vec<RecordRef>,
    #[serde(skip)]
    options: AuditOptions,
}

impl AuditReport {
    pub fn has_findings(&self) -> bool {
        self.invalid_records > 0
            || !self.missing_files.is_empty()
            || !self.empty_files.is_empty()
            || !self.unreadable_files.is_empty()
            || !self.ambiguous_corsica.is_empty()
    }
}

/// Per-department occurrence counters, keyed by department then value.
type Occurrences = HashMap<String, HashMap<String, usize>>;

fn rank_duplicates(occ: Occurrences, limit: usize) -> Vec<DuplicateGroup> {
    let mut out: Vec<DuplicateGroup> = occ
        .into_iter()
        .flat_map(|(dept, values)| {
            values
                .into_iter()
                .filter(|(value, n)| *n > 1 && !value.is_empty())
                .map(move |(value, count)| DuplicateGroup {
                    dept: dept.clone(),
                    value,
                    count,
                })
        })
        .collect();
    out.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.dept.cmp(&a.dept))
            .then_with(|| b.value.cmp(&a.value))
    });
    out.truncate(limit);
    out
}

/// Audits every `cities_<TOKEN>.json` in `dir`.
pub fn audit_dir(dir: &Path, options: AuditOptions) -> Result<AuditReport> {
    let files = list_department_files(dir)?;

    let mut report = AuditReport {
        dir: dir.display().to_string(),
        files: files.len(),
        records: 0,
        invalid_records: 0,
        violations: ViolationCounts::default(),
        empty_files: Vec::new(),
        unreadable_files: Vec::new(),
        missing_files: Vec::new(),
        department_volumes: Vec::new(),
        name_duplicates: Vec::new(),
        postal_code_duplicates: Vec::new(),
        ambiguous_corsica: Vec::new(),
        options,
    };

    let mut volumes: BTreeMap<String, usize> = BTreeMap::new();
    let mut names: Occurrences = HashMap::new();
    let mut cps: Occurrences = HashMap::new();

    for file in &files {
        let file_name = file.file_name();
        let records = match load_city_file(&file.path) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(file = %file_name, "unreadable file: {e}");
                report.unreadable_files.push(file_name);
                continue;
            }
        };
        if records.is_empty() {
            report.empty_files.push(file_name);
            continue;
        }

        for (index, record) in records.into_iter().enumerate() {
            report.records += 1;

            let check = validate(&record);
            if !check.is_valid() {
                report.invalid_records += 1;
                if check.has_empty_field() {
                    report.violations.empty_field += 1;
                }
                if check.has_malformed_postal_code() {
                    report.violations.malformed_postal_code += 1;
                }
                if check.has_department_mismatch() {
                    report.violations.department_mismatch += 1;
                }
            }

            let dept = record.department.trim().to_string();
            *volumes.entry(dept.clone()).or_default() += 1;
            *names
                .entry(dept.clone())
                .or_default()
                .entry(record.name.trim().to_lowercase())
                .or_default() += 1;
            *cps.entry(dept)
                .or_default()
                .entry(record.postal_code.trim().to_string())
                .or_default() += 1;

            if check.needs_corsica_routing() {
                report.ambiguous_corsica.push(RecordRef {
                    file: file_name.clone(),
                    index,
                    record,
                });
            }
        }
    }

    let present: BTreeSet<_> = files.iter().filter_map(|f| f.token.as_ref()).collect();
    report.missing_files = expected_tokens()
        .iter()
        .filter(|t| !present.contains(t))
        .map(|t| t.file_name())
        .collect();

    let mut ranked: Vec<DepartmentVolume> = volumes
        .into_iter()
        .map(|(dept, records)| DepartmentVolume { dept, records })
        .collect();
    ranked.sort_by(|a, b| b.records.cmp(&a.records).then_with(|| a.dept.cmp(&b.dept)));
    report.department_volumes = ranked;

    report.name_duplicates = rank_duplicates(names, options.top_duplicates);
    report.postal_code_duplicates = rank_duplicates(cps, options.top_duplicates);

    Ok(report)
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    if items.is_empty() {
        writeln!(f, "OK")
    } else {
        items.iter().try_for_each(|i| writeln!(f, "{i}"))
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== AUDIT CITIES ===")?;
        writeln!(f, "Directory: {}", self.dir)?;
        writeln!(f, "Files found: {}", self.files)?;
        writeln!(f, "Records: {}", self.records)?;
        writeln!(f, "Invalid records: {}", self.invalid_records)?;
        if self.invalid_records > 0 {
            writeln!(f, "  empty field: {}", self.violations.empty_field)?;
            writeln!(f, "  malformed postal code: {}", self.violations.malformed_postal_code)?;
            writeln!(f, "  department mismatch: {}", self.violations.department_mismatch)?;
        }

        writeln!(f, "\n--- Empty files ---")?;
        write_list(f, &self.empty_files)?;

        if !self.unreadable_files.is_empty() {
            writeln!(f, "\n--- Unreadable files ---")?;
            write_list(f, &self.unreadable_files)?;
        }

        writeln!(f, "\n--- Missing files (expected) ---")?;
        write_list(f, &self.missing_files)?;

        writeln!(
            f,
            "\n--- Top {} departments by volume ---",
            self.options.top_departments
        )?;
        for v in self.department_volumes.iter().take(self.options.top_departments) {
            writeln!(f, "{} {}", v.dept, v.records)?;
        }

        writeln!(f, "\n--- Duplicates (same name+dept): top {} ---", self.options.top_duplicates)?;
        for d in &self.name_duplicates {
            writeln!(f, "{} {} {}", d.dept, d.count, d.value)?;
        }

        writeln!(f, "\n--- Duplicates (same cp+dept): top {} ---", self.options.top_duplicates)?;
        for d in &self.postal_code_duplicates {
            writeln!(f, "{} {} {}", d.dept, d.count, d.value)?;
        }

        writeln!(f, "\n--- Corsica to re-route (dept \"20\") ---")?;
        if self.ambiguous_corsica.is_empty() {
            writeln!(f, "OK")?;
        } else {
            for r in &self.ambiguous_corsica {
                writeln!(f, "{} #{} {} {}", r.file, r.index, r.record.postal_code, r.record.name)?;
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// INVALID LISTING
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidEntry {
    pub file: String,
    pub index: usize,
    pub record: CityRecord,
    pub violations: Vec<Violation>,
}

impl fmt::Display for InvalidEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reasons: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{} #{} name={:?} cp={:?} dept={:?}: {}",
            self.file,
            self.index,
            self.record.name,
            self.record.postal_code,
            self.record.department,
            reasons.join("; ")
        )
    }
}

/// Every invalid record in `dir`, in file then position order. Unreadable
/// files are logged and skipped.
pub fn list_invalid(dir: &Path) -> Result<Vec<InvalidEntry>> {
    let mut out = Vec::new();
    for file in list_department_files(dir)? {
        let records = match load_city_file(&file.path) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(file = %file.file_name(), "unreadable file: {e}");
                continue;
            }
        };
        for (index, record) in records.into_iter().enumerate() {
            let check = validate(&record);
            if !check.is_valid() {
                out.push(InvalidEntry {
                    file: file.file_name(),
                    index,
                    violations: check.violations().to_vec(),
                    record,
                });
            }
        }
    }
    Ok(out)
}
