//! Read-side commands: search, stats, analyze, compare, records and history

use colored::Colorize;

use super::shared::print_json;
use crate::app::models::{ImportRun, ImportStatus, TestRecord};
use crate::app::services::query_engine::{
    Comparison, FrequencyAnalysis, QueryEngine, SearchResult, StatisticsSnapshot,
};
use crate::app::services::store::Store;
use crate::cli::args::{AnalyzeArgs, CompareArgs, HistoryArgs, OutputFormat, RecordsArgs, SearchArgs};
use crate::config::Config;
use crate::{FrequencyBand, Result};

fn engine(config: &Config, store: Store) -> QueryEngine {
    QueryEngine::with_config(store, config.query.clone())
}

pub async fn run_search(
    args: &SearchArgs,
    config: &Config,
    store: Store,
    format: OutputFormat,
) -> Result<()> {
    let result = engine(config, store)
        .search_page(&args.filter(), args.page, args.per_page)
        .await?;

    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Text => {
            print_search(&result);
            Ok(())
        }
    }
}

pub async fn run_stats(config: &Config, store: Store, format: OutputFormat) -> Result<()> {
    let snapshot = engine(config, store).statistics().await?;

    match format {
        OutputFormat::Json => print_json(&snapshot),
        OutputFormat::Text => {
            print_statistics(&snapshot);
            Ok(())
        }
    }
}

pub async fn run_analyze(
    args: &AnalyzeArgs,
    config: &Config,
    store: Store,
    format: OutputFormat,
) -> Result<()> {
    let analysis = engine(config, store)
        .analyze_frequency_label(&args.serial, &args.band)
        .await?;

    match format {
        OutputFormat::Json => print_json(&analysis),
        OutputFormat::Text => {
            print_analysis(&analysis, true);
            Ok(())
        }
    }
}

pub async fn run_compare(
    args: &CompareArgs,
    config: &Config,
    store: Store,
    format: OutputFormat,
) -> Result<()> {
    let band: FrequencyBand = args.band.parse()?;
    let comparison = engine(config, store)
        .compare(&args.first, &args.second, band)
        .await?;

    match format {
        OutputFormat::Json => print_json(&comparison),
        OutputFormat::Text => {
            print_comparison(&comparison);
            Ok(())
        }
    }
}

pub async fn run_records(
    args: &RecordsArgs,
    config: &Config,
    store: Store,
    format: OutputFormat,
) -> Result<()> {
    let records = engine(config, store)
        .records_for_serial(&args.serial)
        .await?;

    match format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No records for serial {}", args.serial.bold());
            } else {
                print_record_table(&records);
            }
            Ok(())
        }
    }
}

pub async fn run_history(
    args: &HistoryArgs,
    config: &Config,
    store: Store,
    format: OutputFormat,
) -> Result<()> {
    let runs = engine(config, store).import_history(args.limit).await?;

    match format {
        OutputFormat::Json => print_json(&runs),
        OutputFormat::Text => {
            print_history(&runs);
            Ok(())
        }
    }
}

fn print_search(result: &SearchResult) {
    let page = &result.pagination;
    println!(
        "{} {} matching record(s), page {} of {}",
        "Search:".bold(),
        page.total,
        page.page,
        page.pages.max(1)
    );
    if !result.records.is_empty() {
        print_record_table(&result.records);
    }
    if page.has_next() {
        println!("{}", format!("more results: --page {}", page.page + 1).dimmed());
    }
}

fn print_record_table(records: &[TestRecord]) {
    println!(
        "{}",
        format!(
            "{:>6}  {:<16} {:<8} {:<6} {:<5}  {:>5}  {}",
            "ID", "SERIAL", "DATE", "TIME", "VAR", "BANDS", "FILE"
        )
        .bold()
    );
    for record in records {
        println!(
            "{:>6}  {:<16} {:<8} {:<6} {:<5}  {:>5}  {}",
            record.id,
            record.serial,
            record.test_date,
            record.test_time,
            record.variant,
            record.bands.present().count(),
            record.filename.as_deref().unwrap_or("-")
        );
    }
}

fn print_statistics(snapshot: &StatisticsSnapshot) {
    println!("{}", "Store statistics".bold());
    println!("  records:  {}", snapshot.total_records);
    println!("  serials:  {}", snapshot.total_serials);
    println!(
        "  latest test date: {}",
        snapshot.latest_test_date.as_deref().unwrap_or("-")
    );

    println!("{}", "Records per variant".bold());
    for (variant, count) in &snapshot.variant_counts {
        println!("  {:<5} {}", variant, count);
    }

    if !snapshot.top_serials.is_empty() {
        println!("{}", "Top serials".bold());
        for (rank, entry) in snapshot.top_serials.iter().enumerate() {
            println!("  {:>2}. {:<16} {}", rank + 1, entry.serial, entry.count);
        }
    }
}

fn print_analysis(analysis: &FrequencyAnalysis, with_series: bool) {
    println!(
        "{} {} at {} Hz",
        "Serial".bold(),
        analysis.serial.cyan(),
        analysis.band
    );
    println!(
        "  count: {}  min: {:.2}  max: {:.2}  mean: {:.2}  latest: {:.2}",
        analysis.count, analysis.min, analysis.max, analysis.mean, analysis.latest
    );

    if with_series {
        for point in &analysis.series {
            println!(
                "    {} {} {:<5} {:>8.2}",
                point.test_date, point.test_time, point.variant, point.value
            );
        }
    }
}

fn print_comparison(comparison: &Comparison) {
    print_analysis(&comparison.first, false);
    print_analysis(&comparison.second, false);

    let verdict = match &comparison.higher_mean {
        Some(serial) => format!("{} has the higher mean", serial).green(),
        None => "means are equal".yellow(),
    };
    println!(
        "{} {:+.2} ({})",
        "Mean difference:".bold(),
        comparison.mean_difference,
        verdict
    );
}

fn print_history(runs: &[ImportRun]) {
    if runs.is_empty() {
        println!("No imports yet");
        return;
    }

    println!(
        "{}",
        format!(
            "{:>5}  {:<25} {:<10} {:>6} {:>6} {:>6} {:>6}  {}",
            "RUN", "STARTED", "STATUS", "ROWS", "OK", "FAIL", "DUP", "FILE"
        )
        .bold()
    );
    for run in runs {
        let status = match run.status {
            ImportStatus::Completed => run.status.as_str().green(),
            ImportStatus::Failed => run.status.as_str().red(),
            ImportStatus::Processing => run.status.as_str().yellow(),
        };
        println!(
            "{:>5}  {:<25} {:<10} {:>6} {:>6} {:>6} {:>6}  {}",
            run.id,
            run.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            status,
            run.total_rows,
            run.successful_imports,
            run.failed_imports,
            run.duplicate_skips,
            run.filename
        );
        if let Some(message) = &run.error_message {
            println!("       {}", message.dimmed());
        }
    }
}
