//! SQLite storage handle
//!
//! [`Store`] is an explicitly constructed handle around a connection pool.
//! Callers create it, call [`Store::initialize`] once, share clones freely,
//! and call [`Store::close`] on shutdown. Uniqueness of
//! (serial, date, time, variant) is enforced by the schema itself.

pub mod import_runs;
pub mod records;
pub mod schema;

pub use records::InsertOutcome;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::{Error, Result};

/// Shared handle to the measurement database
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database described by `config`
    ///
    /// File databases use WAL and a busy timeout so concurrent imports queue
    /// their writes instead of failing on a locked database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if is_memory_url(&config.url) {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| Error::database(format!("Invalid database URL '{}'", config.url), e))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let parent = options
            .get_filename()
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            std::fs::create_dir_all(dir).map_err(|e| {
                Error::io(
                    format!("Failed to create database directory {}", dir.display()),
                    e,
                )
            })?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.busy_timeout_ms.max(1_000)))
            .connect_with(options)
            .await
            .map_err(|e| Error::database(format!("Failed to open database {}", config.url), e))?;

        info!(
            "Connected to database {} ({} connections, busy_timeout={}ms)",
            config.url, config.max_connections, config.busy_timeout_ms
        );
        Ok(Self { pool })
    }

    /// Private in-memory database
    ///
    /// A single connection that is never recycled, so the data lives as long
    /// as the handle.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| Error::database("Failed to open in-memory database", e))?;

        debug!("Opened in-memory database");
        Ok(Self { pool })
    }

    /// Create tables and indexes; safe to call repeatedly
    pub async fn initialize(&self) -> Result<()> {
        schema::create_all(&self.pool).await
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database pool closed");
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = Store::in_memory().await.unwrap();
        store.initialize().await.unwrap();
        store.initialize().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(store.pool())
        .await
        .unwrap();
        assert_eq!(tables, vec!["import_runs", "test_records"]);
    }

    #[tokio::test]
    async fn test_connect_creates_file_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("sweeps.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            ..DatabaseConfig::default()
        };

        let store = Store::connect(&config).await.unwrap();
        store.initialize().await.unwrap();
        assert!(path.exists());

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        store.close().await;
    }

    #[tokio::test]
    async fn test_memory_url_uses_private_database() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        let store = Store::connect(&config).await.unwrap();
        store.initialize().await.unwrap();
    }

    #[test]
    fn test_is_memory_url() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url("sqlite://file?mode=memory"));
        assert!(!is_memory_url("sqlite://data/test_records.db"));
    }
}
