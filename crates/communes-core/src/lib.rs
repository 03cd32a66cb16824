// crates/communes-core/src/lib.rs

//! Reconciliation primitives for the French communes reference dataset:
//! one `cities_<TOKEN>.json` per department, built from the official
//! postal-code CSV.
//!
//! Builder path: [`loader`] → [`token`] / [`validate`] → [`dedup`] →
//! [`writer`]. Audit path: [`loader`] → [`validate`] → [`audit`].

pub mod audit;
pub mod config;
pub mod dataset;
pub mod dedup;
pub mod error;
pub mod loader;
pub mod model;
pub mod token;
pub mod validate;
pub mod writer;

// Re-exports
pub use crate::audit::{audit_dir, list_invalid, AuditOptions, AuditReport, InvalidEntry};
pub use crate::config::{ColumnAliases, ConfigFile, CsvOptions, SourceEncoding};
pub use crate::dataset::{compact_dir, dedup_dir, CompactSummary, DirDedupSummary};
pub use crate::dedup::{dedup_identity, CompactAccumulator, DedupOutcome};
pub use crate::error::{CommuneError, Result};
pub use crate::loader::builder::{build_from_csv, BuildOptions, BuildSummary};
pub use crate::loader::{load, RawRecord, SourceKind};
pub use crate::model::{CityRecord, CompactRecord, Dataset};
pub use crate::token::{derive_token, expected_tokens, DepartmentToken};
pub use crate::validate::{validate, Validation, Violation};
