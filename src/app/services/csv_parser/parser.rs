//! Core sweep CSV parser implementation
//!
//! This module handles file reading, text decoding with the declared encoding,
//! header mapping and the per-row loop. File-level problems are reported on the
//! returned [`ParseResult`] and leave the outcome list empty; row-level problems
//! become invalid outcomes and never stop the loop.

use encoding_rs::Encoding;
use std::path::Path;
use tracing::{debug, info, warn};

use super::column_mapping::ColumnMapping;
use super::record_parser::parse_row;
use super::stats::{ParseResult, ParseStats};
use crate::app::models::RowOutcome;
use crate::constants::DEFAULT_MAX_FILE_SIZE;
use crate::{Error, Result};

/// Parser for sweep measurement CSV files
///
/// The whole file is loaded into memory; the first column of every row holds
/// the identifier and the remaining columns are matched to frequency bands.
#[derive(Debug, Clone)]
pub struct CsvFileParser {
    max_file_size: u64,
}

impl Default for CsvFileParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFileParser {
    pub fn new() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Reject files larger than `bytes`
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Parse a file decoded with the given encoding label (e.g. `utf-8`, `big5`)
    pub fn parse_file(&self, file_path: &Path, encoding: &str) -> ParseResult {
        info!(
            "Parsing sweep CSV file: {} (encoding {})",
            file_path.display(),
            encoding
        );

        match self.read_decoded(file_path, encoding) {
            Ok(content) => self.parse_str(&content),
            Err(e) => {
                warn!("Failed to read {}: {}", file_path.display(), e);
                ParseResult::file_failure(e.to_string())
            }
        }
    }

    /// Parse already decoded CSV text
    pub fn parse_str(&self, content: &str) -> ParseResult {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mapping = match csv_reader
            .headers()
            .map_err(|e| Error::csv_parsing("input", "Failed to read CSV headers", Some(e)))
            .and_then(ColumnMapping::analyze)
        {
            Ok(mapping) => mapping,
            Err(e) => return ParseResult::file_failure(e.to_string()),
        };

        let (total_cols, mapped_bands) = mapping.stats();
        debug!(
            "Column mapping: {} total columns, {} bands mapped: {:?}",
            total_cols,
            mapped_bands,
            mapping.mapped_bands()
        );
        if mapped_bands == 0 {
            warn!("No frequency columns recognised; every row will be rejected");
        }

        let mut stats = ParseStats::new();
        let mut outcomes = Vec::new();

        for (row_index, result) in csv_reader.records().enumerate() {
            stats.total_rows += 1;

            let outcome = match result {
                Ok(record) => {
                    let (outcome, rejected) = parse_row(&record, &mapping, row_index);
                    stats.rejected_values += rejected;
                    outcome
                }
                Err(e) => {
                    warn!("Row {} could not be read: {}", row_index + 1, e);
                    RowOutcome::malformed(row_index, format!("row could not be read: {}", e))
                }
            };

            if let Some(failure) = &outcome.failure {
                debug!("Row {} rejected: {}", outcome.row_number(), failure);
            }
            stats.record(&outcome);
            outcomes.push(outcome);
        }

        info!(
            "Parsed {} rows: {} valid, {} bad identifiers, {} bad data",
            stats.total_rows, stats.valid_rows, stats.invalid_identifiers, stats.invalid_data
        );

        ParseResult {
            outcomes,
            stats,
            mapping: Some(mapping),
        }
    }

    /// Read the whole file and decode it
    fn read_decoded(&self, file_path: &Path, encoding: &str) -> Result<String> {
        let display = file_path.display().to_string();

        let metadata = std::fs::metadata(file_path)
            .map_err(|e| Error::file_access(&display, format!("cannot open file: {}", e)))?;
        if metadata.len() > self.max_file_size {
            return Err(Error::file_access(
                &display,
                format!(
                    "file is {} bytes, larger than the {} byte limit",
                    metadata.len(),
                    self.max_file_size
                ),
            ));
        }

        let bytes = std::fs::read(file_path)
            .map_err(|e| Error::file_access(&display, format!("cannot read file: {}", e)))?;

        decode_bytes(&bytes, encoding, &display)
    }
}

/// Decode raw bytes with a WHATWG encoding label
///
/// A byte order mark matching the declared encoding is dropped. Malformed
/// input is an error rather than being replaced.
pub fn decode_bytes(bytes: &[u8], label: &str, file: &str) -> Result<String> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::encoding(file, format!("unknown encoding label '{}'", label)))?;

    let body = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
        _ => bytes,
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            Error::encoding(
                file,
                format!("content is not valid {}", encoding.name()),
            )
        })
}
