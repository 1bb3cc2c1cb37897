//! Read-side queries over persisted test records
//!
//! - [`search`] - Filtered, paginated record search
//! - [`statistics`] - Aggregate snapshot over the whole store
//! - [`analysis`] - Per-serial frequency analysis and comparison

pub mod analysis;
pub mod search;
pub mod statistics;

#[cfg(test)]
pub mod tests;

pub use analysis::{Comparison, FrequencyAnalysis, SeriesPoint};
pub use search::{PaginationInfo, SearchFilter, SearchResult};
pub use statistics::{SerialCount, StatisticsSnapshot};

use crate::Result;
use crate::app::models::ImportRun;
use crate::app::services::store::Store;
use crate::config::QueryConfig;

/// Read-only query facade over a [`Store`]
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Store,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(store: Store) -> Self {
        Self::with_config(store, QueryConfig::default())
    }

    pub fn with_config(store: Store, config: QueryConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Most recent import runs, newest first
    pub async fn import_history(&self, limit: Option<u32>) -> Result<Vec<ImportRun>> {
        let limit = limit.unwrap_or(self.config.history_limit).max(1);
        self.store.recent_runs(limit).await
    }
}
