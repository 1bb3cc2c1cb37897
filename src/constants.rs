//! Application constants for the sweep importer
//!
//! This module contains the fixed domain tables (frequency bands, variants,
//! identifier layout) and the default values used throughout the crate.

// =============================================================================
// Identifier Layout
// =============================================================================

/// Whole-string identifier pattern: `SERIAL_YYYYMMDD_HHMMSS_VARIANT`
pub const IDENTIFIER_PATTERN: &str = r"^([A-Za-z0-9]+)_([0-9]{8})_([0-9]{6})_(left|right|rec1|rec2)$";

/// Human-readable form of the identifier layout, used in diagnostics
pub const IDENTIFIER_LAYOUT: &str = "SERIAL_YYYYMMDD_HHMMSS_(left|right|rec1|rec2)";

/// Variant tags accepted in the last identifier segment
pub const VARIANT_TAGS: &[&str] = &["left", "right", "rec1", "rec2"];

// =============================================================================
// Frequency Bands
// =============================================================================

/// Canonical frequency band labels, ordered low to high
pub const FREQUENCY_LABELS: &[&str] = &[
    "100", "125", "160", "200", "250", "315", "400", "500", "630", "800", "1000", "1250", "1600",
    "2000",
];

/// Number of canonical frequency bands
pub const BAND_COUNT: usize = 14;

/// Prefixes that, combined with a band label, form a known column alias
///
/// The bare label itself is always an alias as well.
pub const ALIAS_PREFIXES: &[&str] = &["freq_", "F"];

/// Cell values that mean "no measurement" rather than a conversion failure
pub const MISSING_VALUE_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

// =============================================================================
// Validation Defaults
// =============================================================================

/// Validation limits applied before persistence
pub mod validation {
    /// Lowest plausible measurement value (dB)
    pub const MIN_VALUE: f64 = -200.0;

    /// Highest plausible measurement value (dB)
    pub const MAX_VALUE: f64 = 50.0;

    /// Shortest accepted serial
    pub const MIN_SERIAL_LEN: usize = 5;

    /// Longest accepted serial
    pub const MAX_SERIAL_LEN: usize = 50;
}

// =============================================================================
// Import Defaults
// =============================================================================

/// Encoding used when the caller does not declare one
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Largest input file accepted for import (16 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Number of row errors returned to the caller; the rest are only logged
pub const DEFAULT_MAX_REPORTED_ERRORS: usize = 10;

/// File extensions picked up when a directory is given to the importer
pub const ALLOWED_EXTENSIONS: &[&str] = &["csv", "txt"];

// =============================================================================
// Query Defaults
// =============================================================================

/// Records per search page when the caller does not ask for a size
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Upper bound on the search page size
pub const MAX_PER_PAGE: u32 = 100;

/// Number of serials listed in the statistics snapshot
pub const DEFAULT_TOP_SERIALS: u32 = 20;

/// Import runs listed by the history query when no limit is given
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

// =============================================================================
// Storage
// =============================================================================

/// Directory name used under the user's data and config directories
pub const APP_DIR_NAME: &str = "sweep-ingest";

/// Database file name inside the data directory
pub const DATABASE_FILE_NAME: &str = "test_records.db";

/// Milliseconds a writer waits for a competing import to release the database
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Pool size for file-backed databases
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
