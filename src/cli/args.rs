//! Command-line argument definitions for the sweep importer
//!
//! This module defines the CLI interface using the clap derive API. Global
//! options (configuration, database, verbosity, output format) apply to every
//! subcommand.

use crate::app::models::Variant;
use crate::app::services::query_engine::SearchFilter;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the sweep importer
///
/// Imports frequency-sweep test measurements from CSV files into a SQLite
/// store and queries them afterwards.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sweep-ingest",
    version,
    about = "Import frequency-sweep test measurements from CSV and analyse them",
    long_about = "Imports CSV files whose rows are keyed by SERIAL_YYYYMMDD_HHMMSS_VARIANT \
                  identifiers and carry measurements for up to fourteen frequency bands. \
                  Every row is validated independently, each record is stored exactly once, \
                  and every import is audited. Stored records can be searched, summarised, \
                  analysed per band and compared between serials."
)]
pub struct Args {
    /// Configuration file (TOML)
    ///
    /// Defaults to <config dir>/sweep-ingest/config.toml when that file exists.
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Database URL, overriding configuration and DATABASE_URL
    #[arg(long = "database", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for results
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Import one or more CSV files (directories are scanned recursively)
    Import(ImportArgs),
    /// Search stored records
    Search(SearchArgs),
    /// Show aggregate statistics
    Stats,
    /// Analyse one frequency band for one serial
    Analyze(AnalyzeArgs),
    /// Compare two serials at one frequency band
    Compare(CompareArgs),
    /// List every record of one serial
    Records(RecordsArgs),
    /// Show recent import runs
    History(HistoryArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct ImportArgs {
    /// Files or directories to import
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Declared text encoding of the files (e.g. utf-8, big5, windows-1252)
    #[arg(short = 'e', long = "encoding", value_name = "LABEL")]
    pub encoding: Option<String>,

    /// Name recorded in the audit trail (single file only)
    #[arg(long = "source-name", value_name = "NAME")]
    pub source_name: Option<String>,

    /// Files imported at once (defaults to the number of CPUs)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, Parser)]
pub struct SearchArgs {
    /// Serial substring
    #[arg(short = 's', long = "serial")]
    pub serial: Option<String>,

    /// Exact test date (YYYYMMDD)
    #[arg(short = 'd', long = "date")]
    pub date: Option<String>,

    /// Test variant
    #[arg(long = "variant", value_parser = parse_variant)]
    pub variant: Option<Variant>,

    /// Range start (YYYYMMDD, inclusive)
    #[arg(long = "from", requires = "to")]
    pub from: Option<String>,

    /// Range end (YYYYMMDD, inclusive)
    #[arg(long = "to", requires = "from")]
    pub to: Option<String>,

    /// Page number, starting at 1
    #[arg(long = "page", default_value_t = 1)]
    pub page: u32,

    /// Records per page (capped by configuration)
    #[arg(long = "per-page")]
    pub per_page: Option<u32>,
}

impl SearchArgs {
    pub fn filter(&self) -> SearchFilter {
        SearchFilter {
            serial: self.serial.clone(),
            date: self.date.clone(),
            variant: self.variant,
            date_from: self.from.clone(),
            date_to: self.to.clone(),
        }
    }
}

#[derive(Debug, Clone, Parser)]
pub struct AnalyzeArgs {
    #[arg(short = 's', long = "serial")]
    pub serial: String,

    /// Frequency band label, e.g. 1000 or freq_1000
    #[arg(short = 'b', long = "band")]
    pub band: String,
}

#[derive(Debug, Clone, Parser)]
pub struct CompareArgs {
    #[arg(long = "first")]
    pub first: String,

    #[arg(long = "second")]
    pub second: String,

    /// Frequency band label, e.g. 1000 or freq_1000
    #[arg(short = 'b', long = "band")]
    pub band: String,
}

#[derive(Debug, Clone, Parser)]
pub struct RecordsArgs {
    pub serial: String,
}

#[derive(Debug, Clone, Parser)]
pub struct HistoryArgs {
    /// Number of runs to show
    #[arg(short = 'n', long = "limit")]
    pub limit: Option<u32>,
}

impl Args {
    /// Log level from -v/-q, falling back to the configured level
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => configured,
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}

fn parse_variant(value: &str) -> std::result::Result<Variant, String> {
    value.parse().map_err(|e: crate::Error| e.to_string())
}
