//! Tests for parsing statistics

use crate::app::models::{Identifier, IdentifierError, MeasurementSet, RowOutcome};
use crate::app::services::csv_parser::{ParseResult, ParseStats};

#[test]
fn test_record_buckets() {
    let mut stats = ParseStats::new();

    stats.record(&RowOutcome::parsed(
        Identifier::invalid("junk", IdentifierError::FormatMismatch),
        MeasurementSet::new(),
        0,
    ));
    stats.record(&RowOutcome::malformed(1, "unterminated quote"));

    assert_eq!(stats.valid_rows, 0);
    assert_eq!(stats.invalid_identifiers, 1);
    assert_eq!(stats.invalid_data, 1);
    assert_eq!(stats.invalid_rows(), 2);
}

#[test]
fn test_success_rate() {
    let stats = ParseStats {
        total_rows: 4,
        valid_rows: 3,
        ..ParseStats::default()
    };
    assert_eq!(stats.success_rate(), 75.0);
    assert_eq!(ParseStats::new().success_rate(), 0.0);
}

#[test]
fn test_file_failure_has_no_outcomes() {
    let result = ParseResult::file_failure("cannot open file");

    assert!(result.stats.file_error.is_some());
    assert!(result.outcomes.is_empty());
    assert!(result.mapping.is_none());
}
