//! Request and result types for file imports

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app::models::ImportStatistics;
use crate::constants::DEFAULT_ENCODING;

/// One file to import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub path: PathBuf,
    /// Declared text encoding label
    pub encoding: String,
    /// Name recorded in the audit trail and on each record
    pub source_filename: String,
}

impl ImportRequest {
    /// Request with the default encoding, named after the file itself
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let source_filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            path,
            encoding: DEFAULT_ENCODING.to_string(),
            source_filename,
        }
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_source_filename(mut self, name: impl Into<String>) -> Self {
        self.source_filename = name.into();
        self
    }
}

/// A rejected row as shown to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowErrorReport {
    /// 1-based data row number
    pub row: usize,
    pub error: String,
}

/// Summary handed back after an import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportResult {
    /// True when the run completed, even if some rows failed
    pub success: bool,
    pub message: String,
    pub statistics: ImportStatistics,
    /// First rejected rows, capped
    pub errors: Vec<RowErrorReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<i64>,
}

impl ImportResult {
    /// Result for a run that could not complete
    pub fn failed(
        message: impl Into<String>,
        statistics: ImportStatistics,
        run_id: Option<i64>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            statistics,
            errors: Vec::new(),
            run_id,
        }
    }
}

/// Running counters and the capped error list for one import
#[derive(Debug)]
pub(crate) struct ImportTally {
    pub statistics: ImportStatistics,
    pub errors: Vec<RowErrorReport>,
    max_reported_errors: usize,
}

impl ImportTally {
    pub fn new(total_rows: usize, max_reported_errors: usize) -> Self {
        Self {
            statistics: ImportStatistics {
                total_rows,
                ..ImportStatistics::default()
            },
            errors: Vec::new(),
            max_reported_errors,
        }
    }

    pub fn success(&mut self) {
        self.statistics.successful_imports += 1;
    }

    pub fn duplicate(&mut self) {
        self.statistics.duplicate_skips += 1;
    }

    /// Count a failed row; every failure is logged, only the first few are kept
    pub fn fail(&mut self, row: usize, error: impl Into<String>) {
        let error = error.into();
        warn!("Row {} rejected: {}", row, error);

        self.statistics.failed_imports += 1;
        if self.errors.len() < self.max_reported_errors {
            self.errors.push(RowErrorReport { row, error });
        }
    }

    pub fn summary(&self, source_filename: &str) -> String {
        format!(
            "Import of {} completed: {} imported, {} failed, {} duplicates skipped",
            source_filename,
            self.statistics.successful_imports,
            self.statistics.failed_imports,
            self.statistics.duplicate_skips
        )
    }

    pub fn into_result(self, source_filename: &str, run_id: i64) -> ImportResult {
        ImportResult {
            success: true,
            message: self.summary(source_filename),
            statistics: self.statistics,
            errors: self.errors,
            run_id: Some(run_id),
        }
    }
}
