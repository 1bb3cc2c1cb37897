//! Individual CSV row parsing for sweep test files
//!
//! This module turns one CSV record into a [`RowOutcome`]: the identifier in
//! the first column is decoded and every mapped band column is converted to a
//! number. A cell that fails conversion is skipped with a warning; it never
//! rejects the row on its own.

use csv::StringRecord;
use tracing::warn;

use super::column_mapping::ColumnMapping;
use super::identifier::IdentifierParser;
use crate::app::models::{MeasurementSet, RowOutcome};
use crate::constants::MISSING_VALUE_MARKERS;

/// Parse a single data row
///
/// Returns the outcome together with the number of cells that were present
/// but could not be converted.
pub fn parse_row(
    record: &StringRecord,
    mapping: &ColumnMapping,
    row_index: usize,
) -> (RowOutcome, usize) {
    let raw_identifier = record.get(0).unwrap_or("");
    let identifier = IdentifierParser::parse(raw_identifier);

    let (measurements, rejected) = parse_measurements(record, mapping, row_index);

    (
        RowOutcome::parsed(identifier, measurements, row_index),
        rejected,
    )
}

/// Extract band values from the mapped columns of a record
pub fn parse_measurements(
    record: &StringRecord,
    mapping: &ColumnMapping,
    row_index: usize,
) -> (MeasurementSet, usize) {
    let mut measurements = MeasurementSet::new();
    let mut rejected = 0;

    for (&band, column) in &mapping.band_columns {
        let Some(value_str) = record.get(column.index) else {
            continue;
        };
        let trimmed = value_str.trim();

        if is_missing(trimmed) {
            continue;
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                measurements.insert(band, value);
            }
            _ => {
                // Keep the row; only this cell is dropped
                warn!(
                    "Row {}, band {}: could not convert '{}' (column '{}') to a number",
                    row_index + 1,
                    band,
                    trimmed,
                    column.name
                );
                rejected += 1;
            }
        }
    }

    (measurements, rejected)
}

/// Check if a cell means "no measurement"
pub fn is_missing(value: &str) -> bool {
    MISSING_VALUE_MARKERS.contains(&value.trim())
}
