// crates/communes-core/src/validate.rs

//! # Record Validator
//!
//! Structural checks for a single [`CityRecord`]. Every failed check is kept
//! as its own [`Violation`] so audits can report them separately.

use crate::model::CityRecord;
use crate::token::{derive_token, is_postal_code};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    EmptyName,
    EmptyPostalCode,
    EmptyDepartment,
    MalformedPostalCode { value: String },
    DepartmentMismatch { expected: String, found: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::EmptyName => f.write_str("empty name"),
            Violation::EmptyPostalCode => f.write_str("empty postal code"),
            Violation::EmptyDepartment => f.write_str("empty department"),
            Violation::MalformedPostalCode { value } => {
                write!(f, "malformed postal code {value:?}")
            }
            Violation::DepartmentMismatch { expected, found } => {
                write!(f, "department {found:?} does not match postal code (expected {expected:?})")
            }
        }
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validation {
    violations: Vec<Violation>,
    ambiguous_corsica: bool,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn has_empty_field(&self) -> bool {
        self.violations.iter().any(|v| {
            matches!(
                v,
                Violation::EmptyName | Violation::EmptyPostalCode | Violation::EmptyDepartment
            )
        })
    }

    pub fn has_malformed_postal_code(&self) -> bool {
        self.violations
            .iter()
            .any(|v| matches!(v, Violation::MalformedPostalCode { .. }))
    }

    pub fn has_department_mismatch(&self) -> bool {
        self.violations
            .iter()
            .any(|v| matches!(v, Violation::DepartmentMismatch { .. }))
    }

    /// The record sits in the provisional `"20"` bucket and must be moved to
    /// `2A` or `2B` by hand.
    pub fn needs_corsica_routing(&self) -> bool {
        self.ambiguous_corsica
    }
}

/// Checks one record.
///
/// Valid iff the name is non-empty after trimming, the postal code is five
/// digits, the department is non-empty and equals the token derived from the
/// postal code. `2A`/`2B` are exempt from the last check.
pub fn validate(record: &CityRecord) -> Validation {
    let name = record.name.trim();
    let cp = record.postal_code.trim();
    let dept = record.department.trim();

    let mut out = Validation::default();

    if name.is_empty() {
        out.violations.push(Violation::EmptyName);
    }
    if cp.is_empty() {
        out.violations.push(Violation::EmptyPostalCode);
    } else if !is_postal_code(cp) {
        out.violations.push(Violation::MalformedPostalCode {
            value: cp.to_string(),
        });
    }
    if dept.is_empty() {
        out.violations.push(Violation::EmptyDepartment);
        return out;
    }

    if dept == "2A" || dept == "2B" {
        return out;
    }

    if let Some(expected) = derive_token(cp, None) {
        if expected.as_str() != dept {
            out.violations.push(Violation::DepartmentMismatch {
                expected: expected.to_string(),
                found: dept.to_string(),
            });
        } else if expected.is_ambiguous_corsica() {
            out.ambiguous_corsica = true;
        }
    }

    out
}
