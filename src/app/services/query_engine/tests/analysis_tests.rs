//! Tests for frequency analysis, comparison and history queries

use super::*;
use crate::Error;

fn history() -> Vec<Fixture<'static>> {
    vec![
        // Inserted out of order; analysis sorts by test date and time
        ("ABC12345", "20250522", "084534", Variant::Left, Some(-75.5)),
        ("ABC12345", "20250520", "120000", Variant::Right, Some(-70.0)),
        ("ABC12345", "20250522", "070000", Variant::Rec1, Some(-80.0)),
        ("ABC12345", "20250523", "070000", Variant::Rec2, None),
        ("XYZ98765", "20250521", "100000", Variant::Left, Some(-60.0)),
        ("XYZ98765", "20250524", "100000", Variant::Left, Some(-62.0)),
    ]
}

#[tokio::test]
async fn test_frequency_analysis() {
    let engine = create_engine(&history()).await;

    let analysis = engine
        .analyze_frequency("ABC12345", FrequencyBand::Hz1000)
        .await
        .unwrap();

    assert_eq!(analysis.count, 3);
    assert_eq!(analysis.min, -80.0);
    assert_eq!(analysis.max, -70.0);
    assert!((analysis.mean - (-75.166_666)).abs() < 1e-3);
    assert_eq!(analysis.latest, -75.5);

    let order: Vec<_> = analysis
        .series
        .iter()
        .map(|p| (p.test_date.as_str(), p.test_time.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("20250520", "120000"),
            ("20250522", "070000"),
            ("20250522", "084534"),
        ]
    );
}

#[tokio::test]
async fn test_missing_band_is_not_found() {
    let engine = create_engine(&history()).await;

    let err = engine
        .analyze_frequency("ABC12345", FrequencyBand::Hz2000)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let err = engine
        .analyze_frequency("NOSUCH001", FrequencyBand::Hz1000)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_unsupported_band_label() {
    let engine = create_engine(&history()).await;

    let err = engine
        .analyze_frequency_label("ABC12345", "3150")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedBand { .. }));
    assert!(err.is_not_found());

    let ok = engine
        .analyze_frequency_label("ABC12345", "freq_1000")
        .await
        .unwrap();
    assert_eq!(ok.band, FrequencyBand::Hz1000);
}

#[tokio::test]
async fn test_compare() {
    let engine = create_engine(&history()).await;

    let comparison = engine
        .compare("ABC12345", "XYZ98765", FrequencyBand::Hz1000)
        .await
        .unwrap();

    assert_eq!(comparison.second.mean, -61.0);
    assert!(comparison.mean_difference < 0.0);
    assert_eq!(comparison.higher_mean.as_deref(), Some("XYZ98765"));
}

#[tokio::test]
async fn test_compare_needs_both_sides() {
    let engine = create_engine(&history()).await;

    let result = engine
        .compare("ABC12345", "NOSUCH001", FrequencyBand::Hz1000)
        .await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_records_for_serial() {
    let engine = create_engine(&history()).await;

    let records = engine.records_for_serial("ABC12345").await.unwrap();
    let dates: Vec<_> = records.iter().map(|r| r.test_date.as_str()).collect();

    assert_eq!(dates, vec!["20250520", "20250522", "20250522", "20250523"]);
    assert!(engine.records_for_serial("NOSUCH001").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_import_history_limit() {
    let engine = create_engine(&[]).await;
    for name in ["one.csv", "two.csv", "three.csv"] {
        engine.store().create_run(name, None).await.unwrap();
    }

    let runs = engine.import_history(Some(2)).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].filename, "three.csv");

    assert_eq!(engine.import_history(None).await.unwrap().len(), 3);
}
