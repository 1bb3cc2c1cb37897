//! Table definitions
//!
//! The band columns are generated from the [`FrequencyBand`] table so the
//! schema, the insert statement and row decoding always agree.

use sqlx::SqlitePool;
use std::sync::LazyLock;
use tracing::debug;

use crate::app::models::FrequencyBand;
use crate::{Error, Result};

/// Name of the uniqueness constraint over (serial, test_date, test_time, variant)
pub const UNIQUE_CONSTRAINT: &str = "uq_serial_datetime_variant";

/// Every column of `test_records`, in select order
pub static RECORD_COLUMNS: LazyLock<String> = LazyLock::new(|| {
    let mut columns = vec!["id", "serial", "test_date", "test_time", "variant"];
    columns.extend(FrequencyBand::ALL.iter().map(|band| band.column()));
    columns.extend(["filename", "import_time", "created_at", "updated_at"]);
    columns.join(", ")
});

pub const RUN_COLUMNS: &str = "id, filename, file_size, total_rows, successful_imports, \
     failed_imports, duplicate_skips, status, error_message, started_at, completed_at";

fn create_test_records() -> String {
    let band_columns: Vec<String> = FrequencyBand::ALL
        .iter()
        .map(|band| format!("    {} REAL", band.column()))
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS test_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    serial TEXT NOT NULL,
    test_date TEXT NOT NULL,
    test_time TEXT NOT NULL,
    variant TEXT NOT NULL CHECK (variant IN ('left', 'right', 'rec1', 'rec2')),
{},
    filename TEXT,
    import_time TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CONSTRAINT {} UNIQUE (serial, test_date, test_time, variant)
)",
        band_columns.join(",\n"),
        UNIQUE_CONSTRAINT
    )
}

const CREATE_IMPORT_RUNS: &str = "CREATE TABLE IF NOT EXISTS import_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    file_size INTEGER,
    total_rows INTEGER NOT NULL DEFAULT 0,
    successful_imports INTEGER NOT NULL DEFAULT 0,
    failed_imports INTEGER NOT NULL DEFAULT 0,
    duplicate_skips INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'processing'
        CHECK (status IN ('processing', 'completed', 'failed')),
    error_message TEXT,
    started_at TEXT NOT NULL,
    completed_at TEXT
)";

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_test_records_serial ON test_records (serial)",
    "CREATE INDEX IF NOT EXISTS idx_test_records_date ON test_records (test_date)",
    "CREATE INDEX IF NOT EXISTS idx_test_records_variant ON test_records (variant)",
    "CREATE INDEX IF NOT EXISTS idx_test_records_import_time ON test_records (import_time)",
    "CREATE INDEX IF NOT EXISTS idx_import_runs_started_at ON import_runs (started_at)",
];

/// Create all tables and indexes if missing
pub async fn create_all(pool: &SqlitePool) -> Result<()> {
    let records_table = create_test_records();
    let statements = [records_table.as_str(), CREATE_IMPORT_RUNS]
        .into_iter()
        .chain(CREATE_INDEXES.iter().copied());

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| Error::database("Failed to create schema", e))?;
    }

    debug!("Schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_columns_cover_every_band() {
        for band in FrequencyBand::ALL {
            assert!(RECORD_COLUMNS.contains(band.column()));
        }
        assert!(RECORD_COLUMNS.starts_with("id, serial"));
        assert!(RECORD_COLUMNS.ends_with("updated_at"));
    }

    #[test]
    fn test_records_table_declares_unique_key() {
        let sql = create_test_records();
        assert!(sql.contains("UNIQUE (serial, test_date, test_time, variant)"));
        assert!(sql.contains("freq_2000 REAL"));
    }
}
