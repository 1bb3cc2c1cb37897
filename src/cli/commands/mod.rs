//! Command implementations for the sweep importer CLI
//!
//! Each command lives in its own module:
//! - `import`: concurrent file import with progress reporting
//! - `query`: search, statistics, analysis, comparison and history output
//! - `shared`: logging, configuration, store setup and file discovery

pub mod import;
pub mod query;
pub mod shared;

use crate::cli::args::{Args, Commands};
use crate::{Error, Result};

/// Main command runner
///
/// Loads configuration, initializes logging and the store, dispatches to the
/// subcommand and closes the store whatever the outcome.
pub async fn run(args: Args) -> Result<()> {
    let Some(command) = args.command.clone() else {
        return Err(Error::configuration("no command given"));
    };

    let config = shared::load_configuration(&args)?;
    shared::setup_logging(&args, &config);

    let store = shared::open_store(&config).await?;
    let format = args.format;

    let result = match &command {
        Commands::Import(import_args) => {
            import::run_import(import_args, &config, store.clone(), format).await
        }
        Commands::Search(search_args) => {
            query::run_search(search_args, &config, store.clone(), format).await
        }
        Commands::Stats => query::run_stats(&config, store.clone(), format).await,
        Commands::Analyze(analyze_args) => {
            query::run_analyze(analyze_args, &config, store.clone(), format).await
        }
        Commands::Compare(compare_args) => {
            query::run_compare(compare_args, &config, store.clone(), format).await
        }
        Commands::Records(records_args) => {
            query::run_records(records_args, &config, store.clone(), format).await
        }
        Commands::History(history_args) => {
            query::run_history(history_args, &config, store.clone(), format).await
        }
    };

    store.close().await;
    result
}
