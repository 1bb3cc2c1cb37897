//! Semantic checks applied to parsed rows before persistence
//!
//! The parser only establishes that a row is well formed. The validator adds
//! the business rules: the serial must be a plain alphanumeric token of
//! acceptable length and every measurement must lie in the plausible range.

use crate::app::models::{FrequencyBand, RowOutcome};
use crate::config::ImportConfig;
use crate::constants::validation;

/// Why a parsed row was refused before persistence
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("format violation: serial '{serial}' {reason}")]
    SerialFormat { serial: String, reason: String },

    #[error("format violation: band {band} value {value} outside [{min}, {max}]")]
    OutOfRange {
        band: FrequencyBand,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Limits the validator enforces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationRules {
    pub min_value: f64,
    pub max_value: f64,
    pub min_serial_len: usize,
    pub max_serial_len: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_value: validation::MIN_VALUE,
            max_value: validation::MAX_VALUE,
            min_serial_len: validation::MIN_SERIAL_LEN,
            max_serial_len: validation::MAX_SERIAL_LEN,
        }
    }
}

impl From<&ImportConfig> for ValidationRules {
    fn from(config: &ImportConfig) -> Self {
        Self {
            min_value: config.min_value,
            max_value: config.max_value,
            min_serial_len: config.min_serial_len,
            max_serial_len: config.max_serial_len,
        }
    }
}

impl ValidationRules {
    /// Check a row the parser accepted
    ///
    /// Bands are checked low to high and the first offending one is reported.
    pub fn validate_outcome(&self, outcome: &RowOutcome) -> Result<(), ValidationError> {
        self.validate_serial(&outcome.identifier.serial)?;

        for (&band, &value) in &outcome.measurements {
            self.validate_value(band, value)?;
        }
        Ok(())
    }

    pub fn validate_serial(&self, serial: &str) -> Result<(), ValidationError> {
        let length = serial.chars().count();
        if length < self.min_serial_len || length > self.max_serial_len {
            return Err(ValidationError::SerialFormat {
                serial: serial.to_string(),
                reason: format!(
                    "must be {}-{} characters long, got {}",
                    self.min_serial_len, self.max_serial_len, length
                ),
            });
        }
        if !serial.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::SerialFormat {
                serial: serial.to_string(),
                reason: "may only contain ASCII letters and digits".to_string(),
            });
        }
        Ok(())
    }

    /// Inclusive range check
    pub fn validate_value(&self, band: FrequencyBand, value: f64) -> Result<(), ValidationError> {
        if (self.min_value..=self.max_value).contains(&value) {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                band,
                value,
                min: self.min_value,
                max: self.max_value,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::MeasurementSet;
    use crate::app::services::csv_parser::IdentifierParser;

    fn outcome(raw_id: &str, values: &[(FrequencyBand, f64)]) -> RowOutcome {
        let measurements: MeasurementSet = values.iter().copied().collect();
        RowOutcome::parsed(IdentifierParser::parse(raw_id), measurements, 0)
    }

    #[test]
    fn test_valid_row_passes() {
        let rules = ValidationRules::default();
        let row = outcome(
            "ABC12345_20250522_084534_left",
            &[(FrequencyBand::Hz1000, -75.5), (FrequencyBand::Hz100, 50.0)],
        );
        assert!(rules.validate_outcome(&row).is_ok());
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let rules = ValidationRules::default();
        assert!(rules.validate_value(FrequencyBand::Hz100, -200.0).is_ok());
        assert!(rules.validate_value(FrequencyBand::Hz100, 50.0).is_ok());
        assert!(rules.validate_value(FrequencyBand::Hz100, 50.01).is_err());
        assert!(rules.validate_value(FrequencyBand::Hz100, -200.5).is_err());
    }

    #[test]
    fn test_out_of_range_names_band_and_value() {
        let rules = ValidationRules::default();
        let row = outcome(
            "ABC12345_20250522_084534_left",
            &[(FrequencyBand::Hz1000, -75.5), (FrequencyBand::Hz2000, 120.0)],
        );

        let err = rules.validate_outcome(&row).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                band: FrequencyBand::Hz2000,
                value: 120.0,
                min: -200.0,
                max: 50.0,
            }
        );
        let message = err.to_string();
        assert!(message.starts_with("format violation"));
        assert!(message.contains("2000"));
        assert!(message.contains("120"));
    }

    #[test]
    fn test_serial_length() {
        let rules = ValidationRules::default();
        assert!(rules.validate_serial("ABCD").is_err());
        assert!(rules.validate_serial("ABCDE").is_ok());
        assert!(rules.validate_serial(&"A".repeat(50)).is_ok());
        assert!(rules.validate_serial(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_serial_characters() {
        let rules = ValidationRules::default();
        assert!(rules.validate_serial("ABC-12345").is_err());
        assert!(rules.validate_serial("ÄBC12345").is_err());
        assert!(rules.validate_serial("abc12345").is_ok());
    }

    #[test]
    fn test_short_serial_from_identifier() {
        // The identifier pattern accepts any alphanumeric serial; length is a validator rule
        let row = outcome("AB1_20250522_084534_rec2", &[(FrequencyBand::Hz500, -1.0)]);
        assert!(row.is_valid());

        let err = ValidationRules::default().validate_outcome(&row).unwrap_err();
        assert!(matches!(err, ValidationError::SerialFormat { .. }));
    }

    #[test]
    fn test_rules_from_config() {
        let config = ImportConfig {
            min_value: -10.0,
            max_value: 10.0,
            ..ImportConfig::default()
        };
        let rules = ValidationRules::from(&config);
        assert!(rules.validate_value(FrequencyBand::Hz250, -11.0).is_err());
    }
}
