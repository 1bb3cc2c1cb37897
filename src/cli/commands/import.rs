//! Import command
//!
//! Each discovered file becomes its own import run. Files are imported
//! concurrently, bounded by `--jobs` or the configured limit.

use colored::Colorize;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

use super::shared::{create_progress_bar, discover_input_files, format_size, print_json};
use crate::app::services::import_orchestrator::{ImportOrchestrator, ImportRequest, ImportResult};
use crate::app::services::store::Store;
use crate::cli::args::{ImportArgs, OutputFormat};
use crate::config::Config;
use crate::{Error, Result};

/// Result of one file, as reported by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    #[serde(flatten)]
    pub result: ImportResult,
}

pub async fn run_import(
    args: &ImportArgs,
    config: &Config,
    store: Store,
    format: OutputFormat,
) -> Result<()> {
    let start = Instant::now();

    let files = discover_input_files(&args.paths)
        .map_err(|e| Error::file_access("input", format!("{:#}", e)))?;
    if files.is_empty() {
        return Err(Error::file_access(
            "input",
            "no .csv or .txt files found in the given paths",
        ));
    }
    if args.source_name.is_some() && files.len() > 1 {
        return Err(Error::configuration(
            "--source-name can only be used with a single input file",
        ));
    }

    let encoding = args
        .encoding
        .clone()
        .unwrap_or_else(|| config.import.default_encoding.clone());
    let requests: Vec<ImportRequest> = files
        .iter()
        .map(|path| {
            let request = ImportRequest::new(path).with_encoding(encoding.clone());
            match &args.source_name {
                Some(name) => request.with_source_filename(name.clone()),
                None => request,
            }
        })
        .collect();

    let jobs = args.jobs.unwrap_or_else(|| config.import.concurrency()).max(1);
    info!("Importing {} files with {} concurrent jobs", requests.len(), jobs);

    let progress = (format == OutputFormat::Text && requests.len() > 1)
        .then(|| create_progress_bar(requests.len() as u64, "Importing"));

    let orchestrator = ImportOrchestrator::with_config(store, &config.import);
    let mut reports: Vec<FileReport> = stream::iter(requests)
        .map(|request| {
            let orchestrator = orchestrator.clone();
            let progress = progress.clone();
            async move {
                let result = orchestrator.import_file(&request).await;
                if let Some(pb) = &progress {
                    pb.set_message(request.source_filename.clone());
                    pb.inc(1);
                }
                FileReport {
                    file: request.path.display().to_string(),
                    result,
                }
            }
        })
        .buffer_unordered(jobs)
        .collect()
        .await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    reports.sort_by(|a, b| a.file.cmp(&b.file));

    match format {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Text => print_reports(&reports, start.elapsed()),
    }

    let failed = reports.iter().filter(|r| !r.result.success).count();
    if failed > 0 {
        return Err(Error::data_validation(format!(
            "{} of {} files could not be imported",
            failed,
            reports.len()
        )));
    }
    Ok(())
}

fn print_reports(reports: &[FileReport], elapsed: std::time::Duration) {
    for report in reports {
        let result = &report.result;
        let stats = &result.statistics;

        if result.success {
            println!("{} {}", "✓".green(), report.file.bold());
        } else {
            println!("{} {}", "✗".red(), report.file.bold());
        }
        println!("  {}", result.message);

        if result.success {
            println!(
                "  rows: {}  imported: {}  failed: {}  duplicates: {}",
                stats.total_rows,
                stats.successful_imports.to_string().green(),
                stats.failed_imports.to_string().red(),
                stats.duplicate_skips.to_string().yellow()
            );
        }

        for error in &result.errors {
            println!("    row {}: {}", error.row, error.error.dimmed());
        }
        let unreported = stats.failed_imports.saturating_sub(result.errors.len());
        if unreported > 0 {
            println!("    ... {} more row errors in the log", unreported);
        }
    }

    let total_bytes: u64 = reports
        .iter()
        .filter_map(|r| std::fs::metadata(&r.file).ok())
        .map(|m| m.len())
        .sum();
    println!(
        "\n{} file(s), {} in {:.2}s",
        reports.len(),
        format_size(total_bytes),
        elapsed.as_secs_f64()
    );
}
