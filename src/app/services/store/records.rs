//! Test record persistence

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::sync::LazyLock;

use super::Store;
use super::schema::RECORD_COLUMNS;
use crate::app::models::{BandValues, FrequencyBand, NewTestRecord, RecordKey, TestRecord};
use crate::{Error, Result};

/// Result of an insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New row id
    Inserted(i64),
    /// The key already exists; nothing was written
    Duplicate,
}

static INSERT_RECORD: LazyLock<String> = LazyLock::new(|| {
    let band_columns: Vec<&str> = FrequencyBand::ALL.iter().map(|band| band.column()).collect();
    let placeholders = vec!["?"; band_columns.len() + 8].join(", ");
    format!(
        "INSERT INTO test_records (serial, test_date, test_time, variant, {}, \
         filename, import_time, created_at, updated_at) VALUES ({})",
        band_columns.join(", "),
        placeholders
    )
});

impl Store {
    /// Id of the record with this key, if stored
    pub async fn find_record_id(&self, key: &RecordKey) -> Result<Option<i64>> {
        sqlx::query_scalar(
            "SELECT id FROM test_records \
             WHERE serial = ? AND test_date = ? AND test_time = ? AND variant = ?",
        )
        .bind(&key.serial)
        .bind(&key.date)
        .bind(&key.time)
        .bind(key.variant.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| Error::database(format!("Failed to look up record {}", key), e))
    }

    /// Insert a record, reporting a unique-key conflict as [`InsertOutcome::Duplicate`]
    pub async fn insert_record(
        &self,
        record: &NewTestRecord,
        import_time: DateTime<Utc>,
    ) -> Result<InsertOutcome> {
        let mut query = sqlx::query(INSERT_RECORD.as_str())
            .bind(&record.key.serial)
            .bind(&record.key.date)
            .bind(&record.key.time)
            .bind(record.key.variant.as_str());
        for band in FrequencyBand::ALL {
            query = query.bind(record.bands.get(band));
        }
        let now = Utc::now();
        let query = query
            .bind(&record.filename)
            .bind(import_time)
            .bind(now)
            .bind(now);

        match query.execute(self.pool()).await {
            Ok(done) => Ok(InsertOutcome::Inserted(done.last_insert_rowid())),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(Error::database(
                format!("Failed to insert record {}", record.key),
                e,
            )),
        }
    }

    pub async fn get_record(&self, id: i64) -> Result<Option<TestRecord>> {
        let sql = format!("SELECT {} FROM test_records WHERE id = ?", *RECORD_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| Error::database(format!("Failed to load record {}", id), e))?;

        row.as_ref().map(record_from_row).transpose()
    }

    pub async fn count_records(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM test_records")
            .fetch_one(self.pool())
            .await
            .map_err(|e| Error::database("Failed to count records", e))
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Decode a row selected with [`RECORD_COLUMNS`]
pub fn record_from_row(row: &SqliteRow) -> Result<TestRecord> {
    let mut bands = BandValues::default();
    for band in FrequencyBand::ALL {
        bands.set(band, row.try_get::<Option<f64>, _>(band.column())?);
    }

    let variant: String = row.try_get("variant")?;

    Ok(TestRecord {
        id: row.try_get("id")?,
        serial: row.try_get("serial")?,
        test_date: row.try_get("test_date")?,
        test_time: row.try_get("test_time")?,
        variant: variant.parse()?,
        bands,
        filename: row.try_get("filename")?,
        import_time: row.try_get("import_time")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
