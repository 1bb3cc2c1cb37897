//! Import run audit trail
//!
//! A run is created in `processing` and finalized exactly once. The final
//! update is guarded on the current status, so a second attempt changes
//! nothing and is reported as [`Error::RunAlreadyFinalized`].

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::debug;

use super::Store;
use super::schema::RUN_COLUMNS;
use crate::app::models::{ImportRun, ImportStatistics, ImportStatus};
use crate::{Error, Result};

impl Store {
    /// Open a new run in `processing`
    pub async fn create_run(&self, filename: &str, file_size: Option<i64>) -> Result<i64> {
        let done = sqlx::query(
            "INSERT INTO import_runs (filename, file_size, status, started_at) VALUES (?, ?, ?, ?)",
        )
        .bind(filename)
        .bind(file_size)
        .bind(ImportStatus::Processing.as_str())
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .map_err(|e| Error::database(format!("Failed to create import run for {}", filename), e))?;

        let run_id = done.last_insert_rowid();
        debug!("Created import run {} for {}", run_id, filename);
        Ok(run_id)
    }

    /// Record the number of data rows while the run is still processing
    pub async fn set_run_total_rows(&self, run_id: i64, total_rows: usize) -> Result<()> {
        let done = sqlx::query(
            "UPDATE import_runs SET total_rows = ? WHERE id = ? AND status = 'processing'",
        )
        .bind(total_rows as i64)
        .bind(run_id)
        .execute(self.pool())
        .await
        .map_err(|e| Error::database(format!("Failed to update import run {}", run_id), e))?;

        if done.rows_affected() == 0 {
            return Err(Error::RunAlreadyFinalized { run_id });
        }
        Ok(())
    }

    /// Move a processing run to `completed` or `failed`
    pub async fn finalize_run(
        &self,
        run_id: i64,
        status: ImportStatus,
        statistics: &ImportStatistics,
        error_message: Option<&str>,
    ) -> Result<()> {
        if status == ImportStatus::Processing {
            return Err(Error::data_validation(
                "an import run can only be finalized as completed or failed",
            ));
        }

        let done = sqlx::query(
            "UPDATE import_runs SET status = ?, total_rows = ?, successful_imports = ?, \
             failed_imports = ?, duplicate_skips = ?, error_message = ?, completed_at = ? \
             WHERE id = ? AND status = 'processing'",
        )
        .bind(status.as_str())
        .bind(statistics.total_rows as i64)
        .bind(statistics.successful_imports as i64)
        .bind(statistics.failed_imports as i64)
        .bind(statistics.duplicate_skips as i64)
        .bind(error_message)
        .bind(Utc::now())
        .bind(run_id)
        .execute(self.pool())
        .await
        .map_err(|e| Error::database(format!("Failed to finalize import run {}", run_id), e))?;

        if done.rows_affected() == 0 {
            return Err(Error::RunAlreadyFinalized { run_id });
        }
        debug!("Import run {} finalized as {}", run_id, status);
        Ok(())
    }

    pub async fn get_run(&self, run_id: i64) -> Result<Option<ImportRun>> {
        let sql = format!("SELECT {} FROM import_runs WHERE id = ?", RUN_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(run_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| Error::database(format!("Failed to load import run {}", run_id), e))?;

        row.as_ref().map(run_from_row).transpose()
    }

    /// Most recent runs, newest first
    pub async fn recent_runs(&self, limit: u32) -> Result<Vec<ImportRun>> {
        let sql = format!(
            "SELECT {} FROM import_runs ORDER BY started_at DESC, id DESC LIMIT ?",
            RUN_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(|e| Error::database("Failed to load import history", e))?;

        rows.iter().map(run_from_row).collect()
    }
}

fn run_from_row(row: &SqliteRow) -> Result<ImportRun> {
    let status: String = row.try_get("status")?;

    Ok(ImportRun {
        id: row.try_get("id")?,
        filename: row.try_get("filename")?,
        file_size: row.try_get("file_size")?,
        total_rows: row.try_get("total_rows")?,
        successful_imports: row.try_get("successful_imports")?,
        failed_imports: row.try_get("failed_imports")?,
        duplicate_skips: row.try_get("duplicate_skips")?,
        status: status.parse()?,
        error_message: row.try_get("error_message")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> Store {
        let store = Store::in_memory().await.unwrap();
        store.initialize().await.unwrap();
        store
    }

    fn counters() -> ImportStatistics {
        ImportStatistics {
            total_rows: 3,
            successful_imports: 1,
            failed_imports: 1,
            duplicate_skips: 1,
        }
    }

    #[tokio::test]
    async fn test_run_lifecycle() {
        let store = store().await;
        let run_id = store.create_run("sweep.csv", Some(128)).await.unwrap();

        let run = store.get_run(run_id).await.unwrap().unwrap();
        assert_eq!(run.status, ImportStatus::Processing);
        assert_eq!(run.file_size, Some(128));
        assert!(run.completed_at.is_none());

        store.set_run_total_rows(run_id, 3).await.unwrap();
        store
            .finalize_run(run_id, ImportStatus::Completed, &counters(), None)
            .await
            .unwrap();

        let run = store.get_run(run_id).await.unwrap().unwrap();
        assert_eq!(run.status, ImportStatus::Completed);
        assert_eq!(run.total_rows, 3);
        assert_eq!(run.duplicate_skips, 1);
        assert!(run.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_finalize_only_once() {
        let store = store().await;
        let run_id = store.create_run("sweep.csv", None).await.unwrap();

        store
            .finalize_run(run_id, ImportStatus::Failed, &ImportStatistics::default(), Some("boom"))
            .await
            .unwrap();
        let second = store
            .finalize_run(run_id, ImportStatus::Completed, &counters(), None)
            .await;

        assert!(matches!(second, Err(Error::RunAlreadyFinalized { run_id: id }) if id == run_id));
        assert!(store.set_run_total_rows(run_id, 9).await.is_err());

        let run = store.get_run(run_id).await.unwrap().unwrap();
        assert_eq!(run.status, ImportStatus::Failed);
        assert_eq!(run.error_message.as_deref(), Some("boom"));
        assert_eq!(run.total_rows, 0);
    }

    #[tokio::test]
    async fn test_cannot_finalize_as_processing() {
        let store = store().await;
        let run_id = store.create_run("sweep.csv", None).await.unwrap();
        assert!(
            store
                .finalize_run(run_id, ImportStatus::Processing, &counters(), None)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_recent_runs_newest_first() {
        let store = store().await;
        for name in ["a.csv", "b.csv", "c.csv"] {
            store.create_run(name, None).await.unwrap();
        }

        let runs = store.recent_runs(2).await.unwrap();
        let names: Vec<_> = runs.iter().map(|run| run.filename.as_str()).collect();
        assert_eq!(names, vec!["c.csv", "b.csv"]);
    }
}
