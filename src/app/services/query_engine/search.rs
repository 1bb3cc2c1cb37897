//! Filtered record search with pagination
//!
//! Predicates combine with AND. The total is counted over the full filtered
//! set, independent of the page returned. Results are newest import first.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::QueryEngine;
use crate::app::models::{TestRecord, Variant};
use crate::app::services::store::records::record_from_row;
use crate::app::services::store::schema::RECORD_COLUMNS;
use crate::{Error, Result};

/// Optional search predicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Substring of the serial, ASCII case-insensitive
    pub serial: Option<String>,
    /// Exact test date, `YYYYMMDD`
    pub date: Option<String>,
    pub variant: Option<Variant>,
    /// Inclusive range start, `YYYYMMDD`
    pub date_from: Option<String>,
    /// Inclusive range end, `YYYYMMDD`
    pub date_to: Option<String>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    pub fn with_date_range(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.date_from = Some(from.into());
        self.date_to = Some(to.into());
        self
    }

    /// Reject malformed dates and half-open ranges
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("date", &self.date),
            ("date_from", &self.date_from),
            ("date_to", &self.date_to),
        ] {
            if let Some(value) = non_blank(value) {
                if value.len() != 8 || !value.chars().all(|c| c.is_ascii_digit()) {
                    return Err(Error::data_validation(format!(
                        "{} must be YYYYMMDD, got '{}'",
                        name, value
                    )));
                }
            }
        }

        match (non_blank(&self.date_from), non_blank(&self.date_to)) {
            (Some(from), Some(to)) if from > to => Err(Error::data_validation(format!(
                "date range is reversed: {} > {}",
                from, to
            ))),
            (Some(_), None) | (None, Some(_)) => Err(Error::data_validation(
                "a date range needs both a start and an end date",
            )),
            _ => Ok(()),
        }
    }

    /// `WHERE` clause and its bind values, in order
    fn where_clause(&self) -> (String, Vec<String>) {
        let mut sql = String::from(" WHERE 1=1");
        let mut binds = Vec::new();

        if let Some(serial) = non_blank(&self.serial) {
            sql.push_str(" AND instr(lower(serial), lower(?)) > 0");
            binds.push(serial.to_string());
        }
        if let Some(date) = non_blank(&self.date) {
            sql.push_str(" AND test_date = ?");
            binds.push(date.to_string());
        }
        if let Some(variant) = self.variant {
            sql.push_str(" AND variant = ?");
            binds.push(variant.as_str().to_string());
        }
        if let (Some(from), Some(to)) = (non_blank(&self.date_from), non_blank(&self.date_to)) {
            sql.push_str(" AND test_date BETWEEN ? AND ?");
            binds.push(from.to_string());
            binds.push(to.to_string());
        }

        (sql, binds)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Page position and totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
    /// Matching records across all pages
    pub total: u64,
    pub pages: u64,
}

impl PaginationInfo {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            pages: total.div_ceil(u64::from(per_page.max(1))),
        }
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.pages
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub records: Vec<TestRecord>,
    pub pagination: PaginationInfo,
}

impl QueryEngine {
    /// One slice of the filtered set plus the total matching count
    pub async fn search(
        &self,
        filter: &SearchFilter,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<TestRecord>, u64)> {
        filter.validate()?;
        let (where_sql, binds) = filter.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM test_records{}", where_sql);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for value in &binds {
            count_query = count_query.bind(value);
        }
        let total = count_query
            .fetch_one(self.store().pool())
            .await
            .map_err(|e| Error::database("Failed to count search results", e))?;

        let select_sql = format!(
            "SELECT {} FROM test_records{} ORDER BY import_time DESC, id DESC LIMIT ? OFFSET ?",
            *RECORD_COLUMNS, where_sql
        );
        let mut select_query = sqlx::query(&select_sql);
        for value in &binds {
            select_query = select_query.bind(value);
        }
        let rows = select_query
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(self.store().pool())
            .await
            .map_err(|e| Error::database("Failed to search records", e))?;

        let records = rows.iter().map(record_from_row).collect::<Result<Vec<_>>>()?;
        debug!(
            "Search {:?}: {} of {} records (offset {})",
            filter,
            records.len(),
            total,
            offset
        );

        Ok((records, total.max(0) as u64))
    }

    /// Page-numbered search; the page size is clamped to the configured maximum
    pub async fn search_page(
        &self,
        filter: &SearchFilter,
        page: u32,
        per_page: Option<u32>,
    ) -> Result<SearchResult> {
        let page = page.max(1);
        let per_page = self.config().page_size(per_page);
        let offset = u64::from(page - 1) * u64::from(per_page);

        let (records, total) = self.search(filter, per_page, offset).await?;

        Ok(SearchResult {
            records,
            pagination: PaginationInfo::new(page, per_page, total),
        })
    }
}
