//! Configuration management and validation.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables, then command-line flags (applied by the CLI).

use crate::constants::{self, validation};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL, e.g. `sqlite:///var/lib/sweep/test_records.db`
    pub url: String,

    /// Pool size for file-backed databases
    pub max_connections: u32,

    /// How long a writer waits on a locked database (ms)
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: constants::DEFAULT_MAX_CONNECTIONS,
            busy_timeout_ms: constants::DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Import pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Encoding label used when none is declared
    pub default_encoding: String,

    /// Largest accepted input file in bytes
    pub max_file_size: u64,

    /// Row errors returned to the caller per import
    pub max_reported_errors: usize,

    /// Lowest plausible measurement value
    pub min_value: f64,

    /// Highest plausible measurement value
    pub max_value: f64,

    pub min_serial_len: usize,
    pub max_serial_len: usize,

    /// Files imported at once by the CLI (0 = number of CPUs)
    pub max_concurrent_files: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_encoding: constants::DEFAULT_ENCODING.to_string(),
            max_file_size: constants::DEFAULT_MAX_FILE_SIZE,
            max_reported_errors: constants::DEFAULT_MAX_REPORTED_ERRORS,
            min_value: validation::MIN_VALUE,
            max_value: validation::MAX_VALUE,
            min_serial_len: validation::MIN_SERIAL_LEN,
            max_serial_len: validation::MAX_SERIAL_LEN,
            max_concurrent_files: 0,
        }
    }
}

impl ImportConfig {
    /// Effective number of files imported in parallel
    pub fn concurrency(&self) -> usize {
        if self.max_concurrent_files == 0 {
            num_cpus::get().max(1)
        } else {
            self.max_concurrent_files
        }
    }
}

/// Read-side settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_per_page: u32,
    pub max_per_page: u32,

    /// Serials listed in the statistics snapshot
    pub top_serials: u32,

    /// Import runs listed by `history` when no limit is given
    pub history_limit: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_per_page: constants::DEFAULT_PER_PAGE,
            max_per_page: constants::MAX_PER_PAGE,
            top_serials: constants::DEFAULT_TOP_SERIALS,
            history_limit: constants::DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl QueryConfig {
    /// Clamp a requested page size into `1..=max_per_page`
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_per_page)
            .clamp(1, self.max_per_page)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for this crate when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub import: ImportConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Defaults, then `path` if given (or the default config file if it exists),
    /// then process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_layered(path, |key| std::env::var(key).ok())
    }

    /// Layered load with an injectable environment lookup
    pub fn load_layered(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(default_path) => Self::from_file(&default_path)?,
                None => Self::default(),
            },
        };

        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        Self::from_toml(&text)
            .map_err(|e| Error::configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::configuration(format!("invalid TOML: {}", e)))
    }

    /// Apply the recognised environment variables
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = env("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(value) = env("RECORDS_PER_PAGE") {
            self.query.default_per_page = parse_env("RECORDS_PER_PAGE", &value)?;
        }
        if let Some(value) = env("MAX_RECORDS_PER_PAGE") {
            self.query.max_per_page = parse_env("MAX_RECORDS_PER_PAGE", &value)?;
        }
        if let Some(value) = env("MAX_CONTENT_LENGTH") {
            self.import.max_file_size = parse_env("MAX_CONTENT_LENGTH", &value)?;
        }
        if let Some(level) = env("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        Ok(())
    }

    /// Reject inconsistent settings
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(Error::configuration("database.url must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(Error::configuration(
                "database.max_connections must be at least 1",
            ));
        }
        if self.query.default_per_page == 0 || self.query.max_per_page == 0 {
            return Err(Error::configuration("page sizes must be at least 1"));
        }
        if self.query.default_per_page > self.query.max_per_page {
            return Err(Error::configuration(format!(
                "query.default_per_page ({}) exceeds query.max_per_page ({})",
                self.query.default_per_page, self.query.max_per_page
            )));
        }
        if self.import.min_value.partial_cmp(&self.import.max_value)
            != Some(std::cmp::Ordering::Less)
        {
            return Err(Error::configuration(format!(
                "import.min_value ({}) must be below import.max_value ({})",
                self.import.min_value, self.import.max_value
            )));
        }
        if self.import.min_serial_len == 0 || self.import.min_serial_len > self.import.max_serial_len
        {
            return Err(Error::configuration(
                "serial length bounds must satisfy 1 <= min_serial_len <= max_serial_len",
            ));
        }
        if self.import.max_file_size == 0 {
            return Err(Error::configuration("import.max_file_size must be positive"));
        }
        if encoding_rs::Encoding::for_label(self.import.default_encoding.as_bytes()).is_none() {
            return Err(Error::configuration(format!(
                "unknown default encoding '{}'",
                self.import.default_encoding
            )));
        }
        Ok(())
    }

    /// Override the database URL
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database.url = url.into();
        self
    }

    /// Override the log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::configuration(format!("{}='{}': {}", key, value, e)))
}

/// `<user data dir>/sweep-ingest/test_records.db`, or the working directory
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(constants::APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(constants::DATABASE_FILE_NAME)
}

pub fn default_database_url() -> String {
    format!("sqlite://{}", default_database_path().display())
}

/// `<user config dir>/sweep-ingest/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(constants::APP_DIR_NAME).join("config.toml"))
}
