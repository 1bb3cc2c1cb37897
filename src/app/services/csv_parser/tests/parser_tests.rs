//! Tests for the file-level sweep CSV parser

use super::*;
use crate::app::models::{FrequencyBand, RowFailure};
use crate::app::services::csv_parser::{CsvFileParser, decode_bytes};
use std::path::Path;

#[test]
fn test_parse_scenario_rows_in_order() {
    let result = CsvFileParser::new().parse_str(&create_scenario_csv());

    assert_eq!(result.stats.total_rows, 3);
    assert_eq!(result.outcomes.len(), 3);

    let indices: Vec<_> = result.outcomes.iter().map(|o| o.row_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);

    let first = &result.outcomes[0];
    assert!(first.is_valid());
    assert_eq!(first.measurements[&FrequencyBand::Hz1000], -75.5);

    assert!(matches!(
        result.outcomes[1].failure,
        Some(RowFailure::Identifier(_))
    ));

    // Duplicates are the importer's concern; the parser accepts both rows
    assert!(result.outcomes[2].is_valid());
    assert_eq!(result.stats.valid_rows, 2);
    assert_eq!(result.stats.invalid_identifiers, 1);
}

#[test]
fn test_bad_cells_are_skipped_not_fatal() {
    let result = CsvFileParser::new().parse_str(&create_mixed_header_csv());

    let first = &result.outcomes[0];
    assert!(first.is_valid());
    assert_eq!(first.measurements.get(&FrequencyBand::Hz100), Some(&-10.5));
    assert_eq!(first.measurements.get(&FrequencyBand::Hz125), Some(&-11.0));
    assert_eq!(first.measurements.get(&FrequencyBand::Hz160), None);
    assert_eq!(first.measurements.get(&FrequencyBand::Hz200), Some(&-13.25));

    // Only "abc" counts as a rejected cell; missing markers are silent
    assert_eq!(result.stats.rejected_values, 1);
}

#[test]
fn test_row_without_measurements_is_invalid_data() {
    let result = CsvFileParser::new().parse_str(&create_mixed_header_csv());

    assert!(result.outcomes[1].is_valid());
    assert_eq!(
        result.outcomes[2].failure,
        Some(RowFailure::NoMeasurements)
    );
    assert_eq!(result.stats.invalid_data, 1);
    assert_eq!(result.stats.invalid_identifiers, 0);
}

#[test]
fn test_short_rows_are_tolerated() {
    let content = "id,100,125\nABC12345_20250522_084534_left,-1\n";
    let result = CsvFileParser::new().parse_str(content);

    assert_eq!(result.stats.valid_rows, 1);
    assert_eq!(result.outcomes[0].measurements.len(), 1);
}

#[test]
fn test_header_only_file() {
    let result = CsvFileParser::new().parse_str("id,100,125\n");

    assert!(!result.stats.file_error.is_some());
    assert_eq!(result.stats.total_rows, 0);
    assert!(result.outcomes.is_empty());
}

#[test]
fn test_non_finite_values_are_rejected() {
    let content = "id,100,125\nABC12345_20250522_084534_left,inf,-3\n";
    let result = CsvFileParser::new().parse_str(content);

    let outcome = &result.outcomes[0];
    assert!(outcome.is_valid());
    assert_eq!(outcome.measurements.len(), 1);
    assert_eq!(result.stats.rejected_values, 1);
}

#[test]
fn test_parse_file_from_disk() {
    let temp_file = create_temp_file(&create_scenario_csv());
    let result = CsvFileParser::new().parse_file(temp_file.path(), "utf-8");

    assert!(!result.stats.file_error.is_some());
    assert_eq!(result.stats.total_rows, 3);
    assert!(result.mapping.is_some());
}

#[test]
fn test_missing_file_is_file_error() {
    let result = CsvFileParser::new().parse_file(Path::new("/nonexistent/sweep.csv"), "utf-8");

    assert!(result.stats.file_error.is_some());
    assert!(result.outcomes.is_empty());
    assert_eq!(result.stats.total_rows, 0);
}

#[test]
fn test_oversized_file_is_file_error() {
    let temp_file = create_temp_file(&create_scenario_csv());
    let result = CsvFileParser::new()
        .with_max_file_size(8)
        .parse_file(temp_file.path(), "utf-8");

    let message = result.stats.file_error.unwrap();
    assert!(message.contains("byte limit"));
    assert!(result.outcomes.is_empty());
}

#[test]
fn test_wrong_encoding_is_file_error() {
    // Latin-1 "é" is not valid UTF-8
    let temp_file = create_temp_bytes(b"id,1000\nABC12345_20250522_084534_left,-1\xe9\n");
    let result = CsvFileParser::new().parse_file(temp_file.path(), "utf-8");

    assert!(result.stats.file_error.is_some());
    assert!(result.outcomes.is_empty());
}

#[test]
fn test_declared_legacy_encoding() {
    let temp_file = create_temp_bytes(b"id\xe9,1000\nABC12345_20250522_084534_left,-1\n");
    let result = CsvFileParser::new().parse_file(temp_file.path(), "latin1");

    assert!(!result.stats.file_error.is_some());
    assert_eq!(result.mapping.unwrap().identifier_column, "idé");
    assert_eq!(result.stats.valid_rows, 1);
}

#[test]
fn test_unknown_encoding_label() {
    let err = decode_bytes(b"id,100\n", "klingon", "x.csv").unwrap_err();
    assert!(err.to_string().contains("unknown encoding"));
}

#[test]
fn test_utf8_bom_is_dropped() {
    let text = decode_bytes(b"\xef\xbb\xbfid,100\n", "utf-8", "x.csv").unwrap();
    assert!(text.starts_with("id,"));
}
