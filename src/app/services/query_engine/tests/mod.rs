//! Test utilities for query engine testing

use chrono::{Duration, TimeZone, Utc};

use crate::app::models::{BandValues, FrequencyBand, NewTestRecord, RecordKey, Variant};
use crate::app::services::query_engine::QueryEngine;
use crate::app::services::store::Store;

mod analysis_tests;

/// Row fixture: (serial, date, time, variant, 1000 Hz value)
pub type Fixture<'a> = (&'a str, &'a str, &'a str, Variant, Option<f64>);

/// Engine over an in-memory store seeded with `fixtures`
///
/// Each fixture is imported one minute after the previous one, so later
/// fixtures are newer.
pub async fn create_engine(fixtures: &[Fixture<'_>]) -> QueryEngine {
    let store = Store::in_memory().await.unwrap();
    store.initialize().await.unwrap();

    let base = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
    for (i, &(serial, date, time, variant, value)) in fixtures.iter().enumerate() {
        let mut bands = BandValues::default();
        bands.set(FrequencyBand::Hz1000, value);
        bands.set(FrequencyBand::Hz100, Some(-1.0));

        let record = NewTestRecord {
            key: RecordKey {
                serial: serial.to_string(),
                date: date.to_string(),
                time: time.to_string(),
                variant,
            },
            bands,
            filename: "fixture.csv".to_string(),
        };
        store
            .insert_record(&record, base + Duration::minutes(i as i64))
            .await
            .unwrap();
    }

    QueryEngine::new(store)
}

/// `count` records for serial SN00001 on consecutive days
pub async fn create_engine_with_days(count: u32) -> QueryEngine {
    let dates: Vec<String> = (1..=count).map(|day| format!("202501{:02}", day)).collect();
    let fixtures: Vec<Fixture<'_>> = dates
        .iter()
        .map(|date| ("SN00001", date.as_str(), "120000", Variant::Left, Some(-50.0)))
        .collect();
    create_engine(&fixtures).await
}
