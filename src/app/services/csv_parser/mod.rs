//! Sweep CSV parser for frequency measurement files
//!
//! This module turns a measurement file into an ordered list of row outcomes.
//! Each row is judged independently; one bad row never aborts the file.
//!
//! ## Architecture
//!
//! The parser is organized into logical components:
//! - [`identifier`] - `SERIAL_DATE_TIME_VARIANT` decoding
//! - [`column_mapping`] - Header to canonical frequency band resolution
//! - [`record_parser`] - Individual CSV row processing
//! - [`parser`] - File reading, decoding and the row loop
//! - [`stats`] - Parsing statistics and result structures
//!
//! ## Usage
//!
//! ```rust
//! use sweep_ingest::app::services::csv_parser::CsvFileParser;
//!
//! let parser = CsvFileParser::new();
//! let result = parser.parse_str("name,1000\nABC12345_20250522_084534_left,-75.5\n");
//!
//! assert_eq!(result.stats.total_rows, 1);
//! assert_eq!(result.stats.valid_rows, 1);
//! ```

pub mod column_mapping;
pub mod identifier;
pub mod parser;
pub mod record_parser;
pub mod stats;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use column_mapping::{BandColumn, ColumnMapping};
pub use identifier::IdentifierParser;
pub use parser::{CsvFileParser, decode_bytes};
pub use stats::{ParseResult, ParseStats};
