//! Shared components for CLI commands
//!
//! Logging setup, layered configuration, store opening, input discovery and
//! output helpers used by more than one command.

use crate::app::services::store::Store;
use crate::cli::args::Args;
use crate::config::Config;
use crate::constants::ALLOWED_EXTENSIONS;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Set up structured logging on stderr
///
/// `RUST_LOG` wins when set; otherwise the configured level is used, which
/// already reflects -v/-q.
pub fn setup_logging(args: &Args, config: &Config) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = config.logging.level.as_str();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sweep_ingest={}", log_level)));

    // try_init: a second initialization (tests, embedding) is not an error
    let initialized = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if initialized.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Load configuration using the layered approach (file -> env -> args)
pub fn load_configuration(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config_file.as_deref())?;

    if let Some(url) = &args.database_url {
        config = config.with_database_url(url.clone());
    }

    let level = args.log_level(&config.logging.level).to_string();
    config = config.with_log_level(level);

    config.validate()?;
    Ok(config)
}

/// Open and initialize the configured store
pub async fn open_store(config: &Config) -> Result<Store> {
    let store = Store::connect(&config.database).await?;
    store.initialize().await?;
    info!("Using database {}", config.database.url);
    Ok(store)
}

/// Expand the given paths into a sorted, de-duplicated list of input files
///
/// Files are taken as given; directories are walked recursively for
/// `.csv` and `.txt` files.
pub fn discover_input_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    use anyhow::Context;
    use walkdir::WalkDir;

    let mut files = Vec::new();

    for path in paths {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Cannot access input path {}", path.display()))?;

        if metadata.is_file() {
            files.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path).follow_links(false) {
            let entry = entry
                .with_context(|| format!("Failed to scan directory {}", path.display()))?;
            if entry.file_type().is_file() && has_allowed_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();

    debug!("Discovered {} input files", files.len());
    for file in &files {
        debug!("  Found: {}", file.display());
    }

    Ok(files)
}

fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

/// Create a progress bar with consistent styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| Error::data_validation(format!("Failed to serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_discover_walks_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("batch").join("day1");
        std::fs::create_dir_all(&nested).unwrap();

        std::fs::write(dir.path().join("a.csv"), "id\n").unwrap();
        std::fs::write(nested.join("b.TXT"), "id\n").unwrap();
        std::fs::write(nested.join("notes.md"), "# notes\n").unwrap();

        let files = discover_input_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.csv", "b.TXT"]);
    }

    #[test]
    fn test_explicit_files_are_kept_and_deduplicated() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("export.dat");
        std::fs::write(&file, "id\n").unwrap();

        let files = discover_input_files(&[file.clone(), file.clone()]).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_path_has_context() {
        let err = discover_input_files(&[PathBuf::from("/nonexistent/input")]).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/input"));
    }

    #[test]
    fn test_database_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[database]\nurl = \"sqlite://file.db\"\n").unwrap();

        let args = Args::try_parse_from([
            "sweep-ingest",
            "--config",
            config_path.to_str().unwrap(),
            "--database",
            "sqlite::memory:",
            "stats",
        ])
        .unwrap();

        let config = load_configuration(&args).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
    }

    #[test]
    fn test_verbosity_flags_set_the_configured_level() {
        let args = Args::try_parse_from(["sweep-ingest", "-vv", "stats"]).unwrap();
        assert_eq!(load_configuration(&args).unwrap().logging.level, "debug");

        let args = Args::try_parse_from(["sweep-ingest", "-q", "stats"]).unwrap();
        assert_eq!(load_configuration(&args).unwrap().logging.level, "error");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(16 * 1024 * 1024), "16.00 MB");
    }
}
