use clap::Parser;
use std::process;
use sweep_ingest::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    // Without a subcommand, show usage and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Rows already committed stay committed; an interrupted run is left as processing
        tokio::select! {
            result = commands::run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    eprintln!("Failed to listen for CTRL+C: {}", e);
                }
                eprintln!("\nReceived CTRL+C, stopping...");
                Err(sweep_ingest::Error::interrupted("stopped by user"))
            }
        }
    });

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

fn show_help_and_commands() {
    println!("sweep-ingest - frequency sweep measurement importer");
    println!("===================================================");
    println!();
    println!("Import frequency-sweep test measurements from CSV files into a SQLite");
    println!("store, then search, summarise and compare them.");
    println!();
    println!("USAGE:");
    println!("    sweep-ingest [OPTIONS] <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    import      Import CSV files or directories of CSV files");
    println!("    search      Search stored records with filters and pagination");
    println!("    stats       Show record counts, variants and top serials");
    println!("    analyze     Summarise one frequency band for one serial");
    println!("    compare     Compare two serials at one frequency band");
    println!("    records     List every record of one serial");
    println!("    history     Show recent import runs");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>    Configuration file (TOML)");
    println!("        --database <URL>   Database URL, e.g. sqlite://sweeps.db");
    println!("        --format <FORMAT>  text or json");
    println!("    -v, --verbose          More logging (repeatable)");
    println!("    -q, --quiet            Only log errors");
    println!();
    println!("EXAMPLES:");
    println!("    sweep-ingest import data/2025-05/ --encoding utf-8");
    println!("    sweep-ingest search --serial ABC --from 20250501 --to 20250531");
    println!("    sweep-ingest analyze --serial ABC12345 --band 1000");
    println!("    sweep-ingest compare --first ABC12345 --second XYZ98765 --band 1000");
    println!();
    println!("For detailed help on any command, use:");
    println!("    sweep-ingest <COMMAND> --help");
}
