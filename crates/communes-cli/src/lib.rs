//! communes-cli
//! ============
//!
//! Command-line batch tools for the `communes-core` reconciliation library.
//!
//! This crate primarily provides a binary (`communes`). The library target
//! only exists so that the crate has a rendered documentation page.
//!
//! Quick start
//! -----------
//!
//! ```text
//! communes --help
//! communes build --csv base-officielle-codes-postaux.csv --out-dir assets/data/cities
//! communes audit --dir assets/data/cities
//! communes dedup --dir assets/data/cities
//! communes compact --dir assets/data/cities --out assets/data/cities_compact.json
//! communes invalid --dir assets/data/cities
//! ```
//!
//! Every subcommand accepts `--json` for a machine-readable summary,
//! `-v`/`-q` for log verbosity and `--config <file.toml>` for CSV settings.
//!
//! For programmatic access, use the [`communes-core`] crate directly.
