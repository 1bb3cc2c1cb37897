//! Aggregate snapshot over all stored records

use serde::Serialize;
use std::collections::BTreeMap;

use super::QueryEngine;
use crate::app::models::Variant;
use crate::{Error, Result};

/// Record count for one serial
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerialCount {
    pub serial: String,
    pub count: i64,
}

/// Derived, non-persisted store summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub total_serials: i64,
    pub total_records: i64,
    /// Most recent test date (`YYYYMMDD`), if any record exists
    pub latest_test_date: Option<String>,
    /// Record count per variant; every variant is present, zero included
    pub variant_counts: BTreeMap<Variant, i64>,
    /// Serials with the most records; ties go to the lower serial
    pub top_serials: Vec<SerialCount>,
}

impl QueryEngine {
    pub async fn statistics(&self) -> Result<StatisticsSnapshot> {
        let pool = self.store().pool();

        let (total_serials, total_records, latest_test_date): (i64, i64, Option<String>) =
            sqlx::query_as(
                "SELECT COUNT(DISTINCT serial), COUNT(*), MAX(test_date) FROM test_records",
            )
            .fetch_one(pool)
            .await
            .map_err(|e| Error::database("Failed to compute record totals", e))?;

        let mut variant_counts: BTreeMap<Variant, i64> =
            Variant::ALL.into_iter().map(|variant| (variant, 0)).collect();
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT variant, COUNT(*) FROM test_records GROUP BY variant")
                .fetch_all(pool)
                .await
                .map_err(|e| Error::database("Failed to count records per variant", e))?;
        for (variant, count) in rows {
            variant_counts.insert(variant.parse()?, count);
        }

        let top_serials: Vec<(String, i64)> = sqlx::query_as(
            "SELECT serial, COUNT(*) AS record_count FROM test_records \
             GROUP BY serial ORDER BY record_count DESC, serial ASC LIMIT ?",
        )
        .bind(i64::from(self.config().top_serials))
        .fetch_all(pool)
        .await
        .map_err(|e| Error::database("Failed to rank serials", e))?;

        Ok(StatisticsSnapshot {
            total_serials,
            total_records,
            latest_test_date,
            variant_counts,
            top_serials: top_serials
                .into_iter()
                .map(|(serial, count)| SerialCount { serial, count })
                .collect(),
        })
    }
}
