//! Per-serial frequency analysis and pairwise comparison

use serde::Serialize;
use sqlx::Row;

use super::QueryEngine;
use crate::app::models::{FrequencyBand, TestRecord, Variant};
use crate::app::services::store::records::record_from_row;
use crate::app::services::store::schema::RECORD_COLUMNS;
use crate::{Error, Result};

/// One measurement in a serial's history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub test_date: String,
    pub test_time: String,
    pub variant: Variant,
    pub value: f64,
}

/// Summary of one band for one serial, oldest test first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyAnalysis {
    pub serial: String,
    pub band: FrequencyBand,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Value of the most recent test
    pub latest: f64,
    pub series: Vec<SeriesPoint>,
}

impl FrequencyAnalysis {
    /// Summarize an ordered series; `None` when it is empty
    pub fn from_series(serial: &str, band: FrequencyBand, series: Vec<SeriesPoint>) -> Option<Self> {
        let latest = series.last()?.value;
        let values = series.iter().map(|point| point.value);

        let min = values.clone().fold(f64::INFINITY, f64::min);
        let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.sum::<f64>() / series.len() as f64;

        Some(Self {
            serial: serial.to_string(),
            band,
            count: series.len(),
            min,
            max,
            mean,
            latest,
            series,
        })
    }
}

/// Two serials at the same band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub band: FrequencyBand,
    pub first: FrequencyAnalysis,
    pub second: FrequencyAnalysis,
    /// `first.mean - second.mean`
    pub mean_difference: f64,
    /// Serial with the higher mean; `None` when the means are equal
    pub higher_mean: Option<String>,
}

impl Comparison {
    pub fn new(first: FrequencyAnalysis, second: FrequencyAnalysis) -> Self {
        let mean_difference = first.mean - second.mean;
        let higher_mean = if mean_difference > 0.0 {
            Some(first.serial.clone())
        } else if mean_difference < 0.0 {
            Some(second.serial.clone())
        } else {
            None
        };

        Self {
            band: first.band,
            first,
            second,
            mean_difference,
            higher_mean,
        }
    }
}

impl QueryEngine {
    /// Analyze one band of one serial
    ///
    /// Not found when the serial has no record carrying the band.
    pub async fn analyze_frequency(
        &self,
        serial: &str,
        band: FrequencyBand,
    ) -> Result<FrequencyAnalysis> {
        // Column names come from the static band table, never from input
        let sql = format!(
            "SELECT test_date, test_time, variant, {column} AS value FROM test_records \
             WHERE serial = ? AND {column} IS NOT NULL \
             ORDER BY test_date ASC, test_time ASC, id ASC",
            column = band.column()
        );

        let rows = sqlx::query(&sql)
            .bind(serial)
            .fetch_all(self.store().pool())
            .await
            .map_err(|e| Error::database(format!("Failed to load {} for {}", band, serial), e))?;

        let series = rows
            .iter()
            .map(|row| -> Result<SeriesPoint> {
                let variant: String = row.try_get("variant")?;
                Ok(SeriesPoint {
                    test_date: row.try_get("test_date")?,
                    test_time: row.try_get("test_time")?,
                    variant: variant.parse()?,
                    value: row.try_get("value")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        FrequencyAnalysis::from_series(serial, band, series).ok_or_else(|| {
            Error::not_found(format!(
                "no records for serial '{}' at {} Hz",
                serial, band
            ))
        })
    }

    /// Same as [`QueryEngine::analyze_frequency`] for a band given as text
    pub async fn analyze_frequency_label(
        &self,
        serial: &str,
        band_label: &str,
    ) -> Result<FrequencyAnalysis> {
        let band: FrequencyBand = band_label.parse()?;
        self.analyze_frequency(serial, band).await
    }

    /// Compare the means of two serials at one band; both must have data
    pub async fn compare(
        &self,
        first_serial: &str,
        second_serial: &str,
        band: FrequencyBand,
    ) -> Result<Comparison> {
        let first = self.analyze_frequency(first_serial, band).await?;
        let second = self.analyze_frequency(second_serial, band).await?;
        Ok(Comparison::new(first, second))
    }

    /// Every record of one serial, oldest test first
    pub async fn records_for_serial(&self, serial: &str) -> Result<Vec<TestRecord>> {
        let sql = format!(
            "SELECT {} FROM test_records WHERE serial = ? \
             ORDER BY test_date ASC, test_time ASC, id ASC",
            *RECORD_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(serial)
            .fetch_all(self.store().pool())
            .await
            .map_err(|e| Error::database(format!("Failed to load records for {}", serial), e))?;

        rows.iter().map(record_from_row).collect()
    }
}
