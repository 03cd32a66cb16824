use clap::{ArgAction, Parser, Subcommand};
use communes_core::SourceEncoding;
use std::path::PathBuf;

/// CLI arguments for communes
#[derive(Debug, Parser)]
#[command(
    name = "communes",
    version,
    about = "Batch tools for the French communes / postal-code reference dataset"
)]
pub struct CliArgs {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// TOML file with CSV delimiter, encoding and extra column aliases
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build cities_<TOKEN>.json files from the official postal-code CSV
    Build {
        /// Source CSV (may be .gz)
        #[arg(long = "csv")]
        csv: PathBuf,

        /// Directory receiving the per-department files
        #[arg(long = "out-dir")]
        out_dir: PathBuf,

        /// Comma-separated department tokens to (re)build, e.g. 975,980
        #[arg(long = "tokens")]
        tokens: Option<String>,

        /// CSV field delimiter (default ';', "tab" for tabs)
        #[arg(long = "delimiter")]
        delimiter: Option<String>,

        /// Source encoding: utf8, windows-1252 or auto (default)
        #[arg(long = "encoding")]
        encoding: Option<SourceEncoding>,
    },

    /// Report counts, missing/empty files, invalid records and duplicates
    Audit {
        /// Directory holding cities_<TOKEN>.json files
        #[arg(long = "dir")]
        dir: PathBuf,

        /// Number of duplicate groups to show per ranking
        #[arg(long = "top", default_value_t = 10)]
        top: usize,

        /// Number of departments to show in the volume ranking
        #[arg(long = "top-departments", default_value_t = 15)]
        top_departments: usize,
    },

    /// Remove same name + postal code duplicates from every file in place
    Dedup {
        /// Directory holding cities_<TOKEN>.json files
        #[arg(long = "dir")]
        dir: PathBuf,
    },

    /// Write the cross-department compact listing
    Compact {
        /// Directory holding cities_<TOKEN>.json files
        #[arg(long = "dir")]
        dir: PathBuf,

        /// Output file, e.g. cities_compact.json
        #[arg(long = "out")]
        out: PathBuf,
    },

    /// List invalid records with the reason(s) they fail
    Invalid {
        /// Directory holding cities_<TOKEN>.json files
        #[arg(long = "dir")]
        dir: PathBuf,

        /// Maximum number of records to print
        #[arg(long = "limit", default_value_t = 200)]
        limit: usize,
    },
}
