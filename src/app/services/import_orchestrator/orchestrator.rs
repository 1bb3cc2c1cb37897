//! Run lifecycle and per-row persistence
//!
//! A run moves `processing` -> `completed` once every row has been handled,
//! or `processing` -> `failed` when the file cannot be read or the audit
//! record cannot be written. Row-level problems never end a run early.
//! Rows commit one at a time, so a partially imported file stays imported.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::result::{ImportRequest, ImportResult, ImportTally};
use crate::app::models::{ImportStatistics, ImportStatus, NewTestRecord, RowOutcome};
use crate::app::services::csv_parser::{CsvFileParser, ParseResult};
use crate::app::services::store::{InsertOutcome, Store};
use crate::app::services::validator::ValidationRules;
use crate::config::ImportConfig;
use crate::constants::DEFAULT_MAX_REPORTED_ERRORS;

/// Imports files into a [`Store`]
///
/// Cheap to clone; concurrent imports through clones of the same orchestrator
/// each run in their own scope and only meet at the database.
#[derive(Debug, Clone)]
pub struct ImportOrchestrator {
    store: Store,
    parser: CsvFileParser,
    rules: ValidationRules,
    max_reported_errors: usize,
}

impl ImportOrchestrator {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            parser: CsvFileParser::new(),
            rules: ValidationRules::default(),
            max_reported_errors: DEFAULT_MAX_REPORTED_ERRORS,
        }
    }

    pub fn with_config(store: Store, config: &ImportConfig) -> Self {
        Self {
            store,
            parser: CsvFileParser::new().with_max_file_size(config.max_file_size),
            rules: ValidationRules::from(config),
            max_reported_errors: config.max_reported_errors,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Import one file
    ///
    /// Never returns an error: run-level failures come back as a result with
    /// `success == false` and the run marked `failed`.
    pub async fn import_file(&self, request: &ImportRequest) -> ImportResult {
        info!(
            "Importing {} ({}, encoding {})",
            request.source_filename,
            request.path.display(),
            request.encoding
        );

        let file_size = tokio::fs::metadata(&request.path)
            .await
            .ok()
            .map(|metadata| metadata.len() as i64);

        let run_id = match self
            .store
            .create_run(&request.source_filename, file_size)
            .await
        {
            Ok(run_id) => run_id,
            Err(e) => {
                error!("Cannot open import run for {}: {}", request.source_filename, e);
                return ImportResult::failed(
                    format!("Import failed: could not create audit record: {}", e),
                    ImportStatistics::default(),
                    None,
                );
            }
        };

        let parsed = match self.parse(request).await {
            Ok(parsed) => parsed,
            Err(message) => {
                return self
                    .fail_run(run_id, ImportStatistics::default(), message)
                    .await;
            }
        };

        if let Some(file_error) = &parsed.stats.file_error {
            return self
                .fail_run(run_id, ImportStatistics::default(), file_error.clone())
                .await;
        }

        info!(
            "Parsed {}: {} of {} rows valid ({:.1}%), {} rejected by the parser, {} cells skipped",
            request.source_filename,
            parsed.stats.valid_rows,
            parsed.stats.total_rows,
            parsed.stats.success_rate(),
            parsed.stats.invalid_rows(),
            parsed.stats.rejected_values
        );

        let mut tally = ImportTally::new(parsed.stats.total_rows, self.max_reported_errors);

        if let Err(e) = self
            .store
            .set_run_total_rows(run_id, parsed.stats.total_rows)
            .await
        {
            return self.fail_run(run_id, tally.statistics, e.to_string()).await;
        }

        let import_time = Utc::now();
        for outcome in &parsed.outcomes {
            self.import_row(outcome, &request.source_filename, import_time, &mut tally)
                .await;
        }

        debug_assert_eq!(tally.statistics.processed(), tally.statistics.total_rows);

        if let Err(e) = self
            .store
            .finalize_run(run_id, ImportStatus::Completed, &tally.statistics, None)
            .await
        {
            return self.fail_run(run_id, tally.statistics, e.to_string()).await;
        }

        let result = tally.into_result(&request.source_filename, run_id);
        info!("{}", result.message);
        result
    }

    /// Parse on the blocking pool; file reading and decoding are synchronous
    async fn parse(&self, request: &ImportRequest) -> Result<ParseResult, String> {
        let parser = self.parser.clone();
        let path = request.path.clone();
        let encoding = request.encoding.clone();

        tokio::task::spawn_blocking(move || parser.parse_file(&path, &encoding))
            .await
            .map_err(|e| format!("parser task failed: {}", e))
    }

    /// Handle one row; every outcome lands in exactly one counter
    async fn import_row(
        &self,
        outcome: &RowOutcome,
        source_filename: &str,
        import_time: DateTime<Utc>,
        tally: &mut ImportTally,
    ) {
        let row = outcome.row_number();

        if let Some(failure) = &outcome.failure {
            tally.fail(row, failure.to_string());
            return;
        }

        if let Err(violation) = self.rules.validate_outcome(outcome) {
            tally.fail(row, violation.to_string());
            return;
        }

        let Some(record) = NewTestRecord::from_outcome(outcome, source_filename) else {
            tally.fail(row, "parse failure: identifier is incomplete");
            return;
        };

        // Fast path only; the unique constraint decides
        match self.store.find_record_id(&record.key).await {
            Ok(Some(existing)) => {
                debug!("Row {}: {} already stored as #{}", row, record.key, existing);
                tally.duplicate();
                return;
            }
            Ok(None) => {}
            Err(e) => {
                tally.fail(row, format!("persistence failure: {}", e));
                return;
            }
        }

        match self.store.insert_record(&record, import_time).await {
            Ok(InsertOutcome::Inserted(id)) => {
                debug!("Row {}: stored {} as #{}", row, record.key, id);
                tally.success();
            }
            Ok(InsertOutcome::Duplicate) => {
                debug!("Row {}: {} inserted concurrently elsewhere", row, record.key);
                tally.duplicate();
            }
            Err(e) => tally.fail(row, format!("persistence failure: {}", e)),
        }
    }

    /// Mark the run failed and build the failed result
    async fn fail_run(
        &self,
        run_id: i64,
        statistics: ImportStatistics,
        message: String,
    ) -> ImportResult {
        error!("Import run {} failed: {}", run_id, message);

        if let Err(e) = self
            .store
            .finalize_run(run_id, ImportStatus::Failed, &statistics, Some(&message))
            .await
        {
            error!("Could not mark import run {} as failed: {}", run_id, e);
        }

        ImportResult::failed(format!("Import failed: {}", message), statistics, Some(run_id))
    }
}
