//! Parsing statistics and result structures for sweep CSV files
//!
//! This module provides types for tracking per-file parsing counters and
//! carrying the ordered row outcomes to the import stage.

use serde::{Deserialize, Serialize};

use super::column_mapping::ColumnMapping;
use crate::app::models::{RowFailure, RowOutcome};

/// Parsing result with row outcomes and statistics
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// One outcome per data row, in file order
    pub outcomes: Vec<RowOutcome>,

    /// Per-file counters
    pub stats: ParseStats,

    /// Band mapping resolved from the header row, if the header was readable
    pub mapping: Option<ColumnMapping>,
}

impl ParseResult {
    /// Result for a file that could not be opened or decoded
    pub fn file_failure(message: impl Into<String>) -> Self {
        Self {
            outcomes: Vec::new(),
            stats: ParseStats {
                file_error: Some(message.into()),
                ..ParseStats::default()
            },
            mapping: None,
        }
    }
}

/// Per-file parsing counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Number of data rows encountered
    pub total_rows: usize,

    /// Rows with a valid identifier and at least one measurement
    pub valid_rows: usize,

    /// Rows rejected because the identifier did not decode
    pub invalid_identifiers: usize,

    /// Rows rejected for any other reason (no measurements, unreadable row)
    pub invalid_data: usize,

    /// Individual cells skipped because they were not numeric
    pub rejected_values: usize,

    /// File-level failure; when set there are no row outcomes
    pub file_error: Option<String>,
}

impl ParseStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            (self.valid_rows as f64 / self.total_rows as f64) * 100.0
        }
    }

    /// Total rows rejected by the parser
    pub fn invalid_rows(&self) -> usize {
        self.invalid_identifiers + self.invalid_data
    }

    /// Count one outcome into the matching bucket
    pub fn record(&mut self, outcome: &RowOutcome) {
        match &outcome.failure {
            None => self.valid_rows += 1,
            Some(RowFailure::Identifier(_)) => self.invalid_identifiers += 1,
            Some(RowFailure::NoMeasurements | RowFailure::Malformed { .. }) => {
                self.invalid_data += 1
            }
        }
    }
}
