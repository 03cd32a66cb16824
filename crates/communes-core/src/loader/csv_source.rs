// crates/communes-core/src/loader/csv_source.rs
use super::common_io;
use super::{clean, RawRecord};
use crate::config::{ColumnAliases, CsvOptions};
use crate::error::{CommuneError, Result};
use std::path::Path;

/// Header positions of the logical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: usize,
    pub postal_code: usize,
    pub insee: usize,
}

/// Header cell as compared in the lenient pass: no BOM, no leading `#`,
/// no surrounding whitespace, lower-case.
fn fold_header(h: &str) -> String {
    h.trim()
        .trim_start_matches('\u{feff}')
        .trim_start_matches('#')
        .trim()
        .to_lowercase()
}

fn find_column(headers: &[String], aliases: &[String]) -> Option<usize> {
    for alias in aliases {
        if let Some(i) = headers.iter().position(|h| h == alias) {
            return Some(i);
        }
    }
    let folded: Vec<String> = headers.iter().map(|h| fold_header(h)).collect();
    aliases
        .iter()
        .map(|a| fold_header(a))
        .find_map(|a| folded.iter().position(|h| *h == a))
}

/// Maps headers to logical columns.
///
/// Name, postal code and INSEE code are all required. A miss is reported
/// with every missing column and every header that was found.
pub fn resolve_columns(headers: &[String], aliases: &ColumnAliases) -> Result<ColumnMap> {
    let name = find_column(headers, &aliases.name);
    let postal_code = find_column(headers, &aliases.postal_code);
    let insee = find_column(headers, &aliases.insee);

    match (name, postal_code, insee) {
        (Some(name), Some(postal_code), Some(insee)) => Ok(ColumnMap {
            name,
            postal_code,
            insee,
        }),
        _ => {
            let mut missing = Vec::new();
            for (found, wanted) in [
                (name, &aliases.name),
                (postal_code, &aliases.postal_code),
                (insee, &aliases.insee),
            ] {
                if found.is_none() {
                    missing.push(wanted.first().cloned().unwrap_or_default());
                }
            }
            Err(CommuneError::SchemaMismatch {
                missing,
                found: headers.to_vec(),
            })
        }
    }
}

/// Reads a header-driven CSV into normalized records.
///
/// Rows that the CSV parser cannot read are logged and skipped. The header
/// check happens before any row is read.
pub fn load_csv(path: &Path, opts: &CsvOptions) -> Result<Vec<RawRecord>> {
    let text = common_io::read_text(path, opts.encoding)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let cols = resolve_columns(&headers, &opts.aliases)?;
    tracing::debug!(?cols, path = %path.display(), "resolved CSV columns");

    let mut out = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(row = line + 2, "skipping unreadable CSV row: {e}");
                continue;
            }
        };
        let field = |i: usize| row.get(i).and_then(clean);
        out.push(RawRecord {
            name: field(cols.name),
            postal_code: field(cols.postal_code),
            department: None,
            insee: field(cols.insee),
            region: None,
        });
    }
    Ok(out)
}
