// crates/communes-core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the reconciliation primitives.
///
/// Per-record problems are never errors: they are collected as
/// [`Violation`](crate::validate::Violation)s and reported in summaries.
/// Only I/O failures, unparsable files and schema mismatches surface here.
#[derive(Debug, Error)]
pub enum CommuneError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required source column is absent. Fatal for the whole run.
    #[error("missing column(s): {}. Columns found: [{}]", .missing.join(", "), .found.join(", "))]
    SchemaMismatch {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("invalid configuration in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CommuneError>;
