//! Sweep Ingest Library
//!
//! A Rust library for importing frequency-sweep test measurements from CSV
//! files into a SQLite store and analysing them afterwards.
//!
//! This library provides tools for:
//! - Decoding the `SERIAL_DATE_TIME_VARIANT` identifier carried by every row
//! - Mapping loosely named measurement columns onto the canonical frequency bands
//! - Validating rows independently so one bad row never aborts a file
//! - Persisting records exactly once per (serial, date, time, variant)
//! - Auditing every import run and reporting capped per-row diagnostics
//! - Searching, summarising and comparing the persisted measurements

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod csv_parser;
        pub mod import_orchestrator;
        pub mod query_engine;
        pub mod store;
        pub mod validator;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{FrequencyBand, Identifier, ImportRun, RowOutcome, TestRecord, Variant};
pub use app::services::import_orchestrator::{ImportOrchestrator, ImportRequest, ImportResult};
pub use app::services::query_engine::QueryEngine;
pub use app::services::store::Store;
pub use config::Config;

/// Result type alias for the sweep importer
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for import, storage and query operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV reading error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// The declared text encoding is unknown or the bytes do not decode with it
    #[error("Encoding error in file '{file}': {message}")]
    Encoding { file: String, message: String },

    /// The input file cannot be opened or is not acceptable for import
    #[error("File access error for '{path}': {message}")]
    FileAccess { path: String, message: String },

    /// Database operation failed
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Data validation error
    #[error("Data validation error: {message}")]
    DataValidation { message: String },

    /// Requested data does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Frequency band label outside the canonical set
    #[error("Unsupported frequency band: {band}")]
    UnsupportedBand { band: String },

    /// Import run was already completed or failed
    #[error("Import run {run_id} has already been finalized")]
    RunAlreadyFinalized { run_id: i64 },

    /// Processing was interrupted by the user
    #[error("Processing interrupted: {message}")]
    Interrupted { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an encoding error
    pub fn encoding(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encoding {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a file access error
    pub fn file_access(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileAccess {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a database error with context
    pub fn database(message: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Database {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a data validation error
    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::DataValidation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an unsupported band error
    pub fn unsupported_band(band: impl Into<String>) -> Self {
        Self::UnsupportedBand { band: band.into() }
    }

    /// Create an interruption error
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted {
            message: message.into(),
        }
    }

    /// True when the error means "nothing matched" rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UnsupportedBand { .. })
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Self::Database {
            message: "Database operation failed".to_string(),
            source: error,
        }
    }
}
