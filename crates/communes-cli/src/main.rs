//! communes: batch tools for the French communes reference dataset
//!
//! Each subcommand is one batch run over files on disk. Logs go to stderr,
//! the run summary to stdout (or as JSON with `--json`).
//!
//! Usage examples
//! --------------
//!
//! - Build every department from the official postal-code CSV
//!   $ communes build --csv base-officielle-codes-postaux.csv --out-dir assets/data/cities
//!
//! - Rebuild only Saint-Pierre-et-Miquelon and Monaco
//!   $ communes build --csv base.csv --out-dir assets/data/cities --tokens 975,980
//!
//! - Audit the dataset (read-only)
//!   $ communes audit --dir assets/data/cities
//!
//! - Remove duplicates in place, then regenerate the compact listing
//!   $ communes dedup --dir assets/data/cities
//!   $ communes compact --dir assets/data/cities --out assets/data/cities_compact.json
//!
//! - List invalid records with their reasons
//!   $ communes invalid --dir assets/data/cities --limit 50
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::{bail, Context};
use clap::Parser;
use communes_core::config::parse_delimiter;
use communes_core::{
    audit_dir, build_from_csv, compact_dir, dedup_dir, list_invalid, AuditOptions, BuildOptions,
    ConfigFile, CsvOptions, DepartmentToken,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::WARN,
        (false, 0) => LevelFilter::INFO,
        (false, 1) => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_tokens(list: &str) -> anyhow::Result<BTreeSet<DepartmentToken>> {
    let mut out = BTreeSet::new();
    for raw in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match DepartmentToken::parse(raw) {
            Some(t) => {
                out.insert(t);
            }
            None => bail!("invalid department token: {raw:?}"),
        }
    }
    Ok(out)
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose, args.quiet);
    tracing::debug!(?args, "parsed arguments");

    // Defaults, then the config file, then flags
    let mut csv = CsvOptions::default();
    if let Some(path) = &args.config {
        ConfigFile::load(path)?.apply(&mut csv, path)?;
    }

    match args.command {
        Commands::Build {
            csv: csv_path,
            out_dir,
            tokens,
            delimiter,
            encoding,
        } => {
            if let Some(d) = delimiter {
                csv.delimiter = parse_delimiter(&d).map_err(anyhow::Error::msg)?;
            }
            if let Some(enc) = encoding {
                csv.encoding = enc;
            }
            let tokens = match tokens {
                Some(list) => parse_tokens(&list)?,
                None => BTreeSet::new(),
            };

            let opts = BuildOptions { csv, tokens };
            let summary = build_from_csv(&csv_path, &out_dir, &opts)
                .with_context(|| format!("build from {} failed", csv_path.display()))?;

            if args.json {
                print_json(&summary)?;
            } else {
                println!("Build summary:");
                println!("  Rows read: {}", summary.rows_read);
                println!("  Rows skipped (invalid): {}", summary.rows_skipped);
                if summary.rows_filtered > 0 {
                    println!("  Rows outside --tokens: {}", summary.rows_filtered);
                }
                println!("  Duplicates removed: {}", summary.duplicates_removed);
                println!("  Records written: {}", summary.records_written);
                println!("  Files written: {}", summary.files_written);
                println!("  Tokens: {}", summary.tokens.join(" "));
                if summary.ambiguous_corsica > 0 {
                    println!(
                        "  Corsica to re-route (dept \"20\"): {}",
                        summary.ambiguous_corsica
                    );
                }
            }
        }

        Commands::Audit {
            dir,
            top,
            top_departments,
        } => {
            let options = AuditOptions {
                top_departments,
                top_duplicates: top,
            };
            let report = audit_dir(&dir, options)
                .with_context(|| format!("audit of {} failed", dir.display()))?;
            if args.json {
                print_json(&report)?;
            } else {
                print!("{report}");
            }
        }

        Commands::Dedup { dir } => {
            let summary = dedup_dir(&dir)
                .with_context(|| format!("dedup of {} failed", dir.display()))?;
            if args.json {
                print_json(&summary)?;
            } else {
                for f in &summary.per_file {
                    if f.removed > 0 {
                        println!("{}: {} duplicate(s) removed", f.file, f.removed);
                    } else {
                        println!("{}: no duplicates", f.file);
                    }
                }
                for f in &summary.files_failed {
                    println!("{f}: skipped (unreadable)");
                }
                println!(
                    "\nSummary: {} file(s) processed, {} duplicate(s) removed, {} file(s) skipped",
                    summary.files_processed,
                    summary.total_removed,
                    summary.files_failed.len()
                );
            }
        }

        Commands::Compact { dir, out } => {
            let summary = compact_dir(&dir, &out)
                .with_context(|| format!("compact listing of {} failed", dir.display()))?;
            if args.json {
                print_json(&summary)?;
            } else {
                println!("Compact summary:");
                println!("  Files read: {}", summary.files_read);
                println!("  Files skipped (unreadable): {}", summary.files_failed.len());
                println!("  Records skipped (incomplete): {}", summary.records_skipped);
                println!("  Communes written to {}: {}", out.display(), summary.entries);
            }
        }

        Commands::Invalid { dir, limit } => {
            let invalid = list_invalid(&dir)
                .with_context(|| format!("listing invalid records in {} failed", dir.display()))?;
            if args.json {
                print_json(&invalid.iter().take(limit).collect::<Vec<_>>())?;
            } else {
                println!("INVALID: {}", invalid.len());
                for entry in invalid.iter().take(limit) {
                    println!("{entry}");
                }
                if invalid.len() > limit {
                    println!("... {} more", invalid.len() - limit);
                }
            }
        }
    }

    Ok(())
}
