//! Data models for sweep test imports
//!
//! This module contains the core data structures: the decoded row identifier,
//! the canonical frequency bands, per-row parse outcomes, and the two persisted
//! entities (test records and import runs).

use crate::constants::{self, BAND_COUNT};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Variant
// =============================================================================

/// Test variant tag, the last segment of an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Left,
    Right,
    Rec1,
    Rec2,
}

impl Variant {
    /// Every variant in canonical order
    pub const ALL: [Variant; 4] = [Variant::Left, Variant::Right, Variant::Rec1, Variant::Rec2];

    /// Tag as it appears in identifiers and in the store
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Left => "left",
            Variant::Right => "right",
            Variant::Rec1 => "rec1",
            Variant::Rec2 => "rec2",
        }
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Variant::ALL
            .into_iter()
            .find(|variant| variant.as_str() == s)
            .ok_or_else(|| {
                Error::data_validation(format!(
                    "Invalid variant '{}': must be one of {}",
                    s,
                    constants::VARIANT_TAGS.join(", ")
                ))
            })
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// =============================================================================
// Frequency Bands
// =============================================================================

/// Canonical frequency band a record may carry a value for
///
/// Declaration order is low to high, so the derived `Ord` sorts bands by
/// frequency. Each band resolves to a fixed slot in [`BandValues`] and a fixed
/// column in the store through [`FrequencyBand::index`] and
/// [`FrequencyBand::column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrequencyBand {
    Hz100,
    Hz125,
    Hz160,
    Hz200,
    Hz250,
    Hz315,
    Hz400,
    Hz500,
    Hz630,
    Hz800,
    Hz1000,
    Hz1250,
    Hz1600,
    Hz2000,
}

impl FrequencyBand {
    /// Every band, ordered low to high
    pub const ALL: [FrequencyBand; BAND_COUNT] = [
        FrequencyBand::Hz100,
        FrequencyBand::Hz125,
        FrequencyBand::Hz160,
        FrequencyBand::Hz200,
        FrequencyBand::Hz250,
        FrequencyBand::Hz315,
        FrequencyBand::Hz400,
        FrequencyBand::Hz500,
        FrequencyBand::Hz630,
        FrequencyBand::Hz800,
        FrequencyBand::Hz1000,
        FrequencyBand::Hz1250,
        FrequencyBand::Hz1600,
        FrequencyBand::Hz2000,
    ];

    /// Position of this band in [`FrequencyBand::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical label, e.g. `"1000"`
    pub fn label(self) -> &'static str {
        constants::FREQUENCY_LABELS[self.index()]
    }

    /// Store column holding this band's value
    pub fn column(self) -> &'static str {
        const COLUMNS: [&str; BAND_COUNT] = [
            "freq_100", "freq_125", "freq_160", "freq_200", "freq_250", "freq_315", "freq_400",
            "freq_500", "freq_630", "freq_800", "freq_1000", "freq_1250", "freq_1600",
            "freq_2000",
        ];
        COLUMNS[self.index()]
    }

    /// Resolve a label (`"1000"`) or column name (`"freq_1000"`)
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        let label = label.strip_prefix("freq_").unwrap_or(label);
        FrequencyBand::ALL
            .into_iter()
            .find(|band| band.label() == label)
    }
}

impl FromStr for FrequencyBand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FrequencyBand::from_label(s).ok_or_else(|| Error::unsupported_band(s))
    }
}

impl fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl Serialize for FrequencyBand {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Measurements extracted from one row, keyed by band
///
/// Only bands present and numerically convertible in the source row appear.
pub type MeasurementSet = BTreeMap<FrequencyBand, f64>;

/// One nullable value slot per canonical band
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandValues([Option<f64>; BAND_COUNT]);

impl BandValues {
    pub fn get(&self, band: FrequencyBand) -> Option<f64> {
        self.0[band.index()]
    }

    pub fn set(&mut self, band: FrequencyBand, value: Option<f64>) {
        self.0[band.index()] = value;
    }

    /// Bands that carry a value, low to high
    pub fn present(&self) -> impl Iterator<Item = (FrequencyBand, f64)> + '_ {
        FrequencyBand::ALL
            .into_iter()
            .filter_map(|band| self.get(band).map(|value| (band, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

impl From<&MeasurementSet> for BandValues {
    fn from(measurements: &MeasurementSet) -> Self {
        let mut values = BandValues::default();
        for (&band, &value) in measurements {
            values.set(band, Some(value));
        }
        values
    }
}

impl Serialize for BandValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(BAND_COUNT))?;
        for band in FrequencyBand::ALL {
            map.serialize_entry(band.column(), &self.get(band))?;
        }
        map.end()
    }
}

// =============================================================================
// Identifier
// =============================================================================

/// Why an identifier failed to decode
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("format mismatch: expected {}", constants::IDENTIFIER_LAYOUT)]
    FormatMismatch,

    #[error("bad date: '{date}' is not a valid YYYYMMDD calendar date")]
    BadDate { date: String },

    #[error("bad time: '{time}' is not a valid HHMMSS clock time")]
    BadTime { time: String },

    #[error("malformed identifier: {message}")]
    Malformed { message: String },
}

/// Decoded `SERIAL_DATE_TIME_VARIANT` identifier
///
/// Always fully populated. When the structure matched but the date or time is
/// not real, the decoded fields are kept for diagnostics and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    pub serial: String,
    /// `YYYYMMDD`
    pub date: String,
    /// `HHMMSS`
    pub time: String,
    pub variant: Option<Variant>,
    /// Raw text the identifier was decoded from
    pub source: String,
    #[serde(serialize_with = "serialize_error_text")]
    pub error: Option<IdentifierError>,
}

impl Identifier {
    /// Identifier for text that did not decode at all
    pub fn invalid(source: impl Into<String>, error: IdentifierError) -> Self {
        Self {
            serial: String::new(),
            date: String::new(),
            time: String::new(),
            variant: None,
            source: source.into(),
            error: Some(error),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Identity tuple, available only for valid identifiers
    pub fn key(&self) -> Option<RecordKey> {
        match (self.is_valid(), self.variant) {
            (true, Some(variant)) => Some(RecordKey {
                serial: self.serial.clone(),
                date: self.date.clone(),
                time: self.time.clone(),
                variant,
            }),
            _ => None,
        }
    }
}

fn serialize_error_text<S: Serializer, E: fmt::Display>(
    error: &Option<E>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_some(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Unique identity of a test record: (serial, date, time, variant)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordKey {
    pub serial: String,
    pub date: String,
    pub time: String,
    pub variant: Variant,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.serial, self.date, self.time, self.variant
        )
    }
}

// =============================================================================
// Row Outcome
// =============================================================================

/// Why a row was rejected by the file parser
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowFailure {
    #[error("parse failure: {0}")]
    Identifier(IdentifierError),

    #[error("parse failure: no valid frequency measurements found")]
    NoMeasurements,

    #[error("parse failure: {message}")]
    Malformed { message: String },
}

/// Result of parsing one input row; never mutated after creation
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    pub identifier: Identifier,
    pub measurements: MeasurementSet,
    /// Zero-based index of the data row in the source file
    pub row_index: usize,
    pub failure: Option<RowFailure>,
}

impl RowOutcome {
    /// Build an outcome from a decoded identifier and its measurements
    ///
    /// A row is valid iff its identifier is valid and at least one band
    /// carries a value.
    pub fn parsed(identifier: Identifier, measurements: MeasurementSet, row_index: usize) -> Self {
        let failure = if let Some(error) = &identifier.error {
            Some(RowFailure::Identifier(error.clone()))
        } else if measurements.is_empty() {
            Some(RowFailure::NoMeasurements)
        } else {
            None
        };

        Self {
            identifier,
            measurements,
            row_index,
            failure,
        }
    }

    /// Outcome for a row that could not be read at all
    pub fn malformed(row_index: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            identifier: Identifier::invalid(
                "",
                IdentifierError::Malformed {
                    message: message.clone(),
                },
            ),
            measurements: MeasurementSet::new(),
            row_index,
            failure: Some(RowFailure::Malformed { message }),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.failure.is_none()
    }

    /// One-based data row number for user-facing diagnostics
    pub fn row_number(&self) -> usize {
        self.row_index + 1
    }
}

// =============================================================================
// Persisted Entities
// =============================================================================

/// A persisted test record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRecord {
    pub id: i64,
    pub serial: String,
    pub test_date: String,
    pub test_time: String,
    pub variant: Variant,
    #[serde(flatten)]
    pub bands: BandValues,
    pub filename: Option<String>,
    pub import_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TestRecord {
    pub fn value(&self, band: FrequencyBand) -> Option<f64> {
        self.bands.get(band)
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            serial: self.serial.clone(),
            date: self.test_date.clone(),
            time: self.test_time.clone(),
            variant: self.variant,
        }
    }
}

/// Values for a record that is about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewTestRecord {
    pub key: RecordKey,
    pub bands: BandValues,
    pub filename: String,
}

impl NewTestRecord {
    /// Build from a valid outcome, copying only the bands present in it
    pub fn from_outcome(outcome: &RowOutcome, filename: &str) -> Option<Self> {
        if !outcome.is_valid() {
            return None;
        }
        Some(Self {
            key: outcome.identifier.key()?,
            bands: BandValues::from(&outcome.measurements),
            filename: filename.to_string(),
        })
    }
}

/// Lifecycle state of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Processing,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportStatus::Processing => "processing",
            ImportStatus::Completed => "completed",
            ImportStatus::Failed => "failed",
        }
    }
}

impl FromStr for ImportStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "processing" => Ok(ImportStatus::Processing),
            "completed" => Ok(ImportStatus::Completed),
            "failed" => Ok(ImportStatus::Failed),
            _ => Err(Error::data_validation(format!(
                "Invalid import status '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Row counters for one import
///
/// Every data row lands in exactly one of the three outcome buckets, so
/// `successful_imports + failed_imports + duplicate_skips == total_rows` once
/// a run has completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatistics {
    pub total_rows: usize,
    pub successful_imports: usize,
    pub failed_imports: usize,
    pub duplicate_skips: usize,
}

impl ImportStatistics {
    /// Rows that reached one of the outcome buckets
    pub fn processed(&self) -> usize {
        self.successful_imports + self.failed_imports + self.duplicate_skips
    }
}

/// Audit record for one file import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRun {
    pub id: i64,
    pub filename: String,
    pub file_size: Option<i64>,
    pub total_rows: i64,
    pub successful_imports: i64,
    pub failed_imports: i64,
    pub duplicate_skips: i64,
    pub status: ImportStatus,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_identifier() -> Identifier {
        Identifier {
            serial: "ABC12345".to_string(),
            date: "20250522".to_string(),
            time: "084534".to_string(),
            variant: Some(Variant::Left),
            source: "ABC12345_20250522_084534_left".to_string(),
            error: None,
        }
    }

    #[test]
    fn test_band_table_round_trips_labels() {
        for band in FrequencyBand::ALL {
            assert_eq!(FrequencyBand::from_label(band.label()), Some(band));
            assert_eq!(FrequencyBand::from_label(band.column()), Some(band));
            assert_eq!(band.column(), format!("freq_{}", band.label()));
        }
        assert_eq!(FrequencyBand::from_label("999"), None);
        assert!("3150".parse::<FrequencyBand>().is_err());
    }

    #[test]
    fn test_bands_sort_low_to_high() {
        assert!(FrequencyBand::Hz100 < FrequencyBand::Hz1000);
        assert!(FrequencyBand::Hz1600 < FrequencyBand::Hz2000);
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("rec2".parse::<Variant>().unwrap(), Variant::Rec2);
        assert!("LEFT".parse::<Variant>().is_err());
        assert_eq!(Variant::Right.to_string(), "right");
    }

    #[test]
    fn test_band_values_copy_only_present_bands() {
        let mut measurements = MeasurementSet::new();
        measurements.insert(FrequencyBand::Hz1000, -75.5);
        measurements.insert(FrequencyBand::Hz125, -60.0);

        let values = BandValues::from(&measurements);
        assert_eq!(values.get(FrequencyBand::Hz1000), Some(-75.5));
        assert_eq!(values.get(FrequencyBand::Hz2000), None);
        let present: Vec<_> = values.present().collect();
        assert_eq!(
            present,
            vec![(FrequencyBand::Hz125, -60.0), (FrequencyBand::Hz1000, -75.5)]
        );
    }

    #[test]
    fn test_band_values_serialize_as_columns() {
        let mut values = BandValues::default();
        values.set(FrequencyBand::Hz800, Some(-12.5));
        let json = serde_json::to_value(values).unwrap();
        assert_eq!(json["freq_800"], -12.5);
        assert!(json["freq_100"].is_null());
    }

    #[test]
    fn test_row_outcome_validity() {
        let mut measurements = MeasurementSet::new();
        measurements.insert(FrequencyBand::Hz1000, -75.5);

        let outcome = RowOutcome::parsed(valid_identifier(), measurements, 0);
        assert!(outcome.is_valid());
        assert_eq!(outcome.row_number(), 1);

        let empty = RowOutcome::parsed(valid_identifier(), MeasurementSet::new(), 3);
        assert_eq!(empty.failure, Some(RowFailure::NoMeasurements));

        let bad = RowOutcome::parsed(
            Identifier::invalid("junk", IdentifierError::FormatMismatch),
            MeasurementSet::new(),
            1,
        );
        assert!(matches!(
            bad.failure,
            Some(RowFailure::Identifier(IdentifierError::FormatMismatch))
        ));
        assert!(bad.failure.unwrap().to_string().starts_with("parse failure"));
    }

    #[test]
    fn test_new_record_requires_valid_outcome() {
        let mut measurements = MeasurementSet::new();
        measurements.insert(FrequencyBand::Hz630, -40.0);
        let outcome = RowOutcome::parsed(valid_identifier(), measurements, 0);

        let record = NewTestRecord::from_outcome(&outcome, "sweep.csv").unwrap();
        assert_eq!(record.key.to_string(), "ABC12345_20250522_084534_left");
        assert_eq!(record.bands.get(FrequencyBand::Hz630), Some(-40.0));

        let malformed = RowOutcome::malformed(2, "short row");
        assert!(NewTestRecord::from_outcome(&malformed, "sweep.csv").is_none());
    }
}
