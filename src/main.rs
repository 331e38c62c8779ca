//! FairSweep - FAIRness evaluation sweeper
//!
//! Polls a spreadsheet-backed worklist of dataset identifiers, submits
//! unprocessed rows to a remote FAIRness-evaluation service and writes
//! the aggregated scorecard back, tracking per-row status for crash
//! recovery.
//!
//! Exit codes:
//!   0 - Success / clean shutdown
//!   1 - Runtime error (config, store access, etc.)

mod cli;
mod config;
mod evaluator;
mod models;
mod runner;
mod scoring;
mod sheet;
mod worklist;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use sheet::rest::RestSheetStore;
use sheet::SheetSession;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use worklist::select_candidates;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("FairSweep v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if args.dry_run {
        return match handle_dry_run(&config).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Dry run failed: {}", e);
                eprintln!("\n❌ Error: {}", e);
                std::process::exit(1);
            }
        };
    }

    println!("🔁 Starting worklist sweeper");
    println!("   Worksheet: {}", config.sheet.worksheet);
    println!("   Evaluator: {}", config.evaluator.url);
    println!("   Interval:  {}s", config.poll.interval_seconds);
    if args.once {
        println!("   Mode:      single cycle (--once)");
    }

    // Cooperative shutdown: Ctrl-C sets the flag, the runner checks it
    // at cycle and row boundaries
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n🛑 Ctrl-C received, finishing the current row...");
            flag.store(true, Ordering::Relaxed);
        }
    });

    match runner::run(&config, &stop, args.once).await {
        Ok(()) => {
            println!("\n✅ Sweeper stopped.");
            Ok(())
        }
        Err(e) => {
            error!("Sweeper failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default fairsweep.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new("fairsweep.toml");

    if path.exists() {
        eprintln!("⚠️  fairsweep.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write fairsweep.toml")?;

    println!("✅ Created fairsweep.toml with default settings.");
    println!("   Edit it to set the spreadsheet id, token file and evaluator credentials.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Handle --dry-run: scan the worklist, print eligible rows, exit.
async fn handle_dry_run(config: &Config) -> Result<()> {
    println!("\n🔍 Dry run: scanning the worklist (no evaluator calls)...\n");

    let session = RestSheetStore::new(&config.sheet).open_session()?;
    let identifiers = session.read_range(&config.identifier_range()).await?;
    let results = session.read_range(&config.result_range()).await?;
    let candidates = select_candidates(&identifiers, &results, config.sheet.first_row);

    if candidates.is_empty() {
        println!("   No rows waiting for evaluation.");
    } else {
        println!("   Found {} rows that would be processed:\n", candidates.len());
        for (row, identifier) in &candidates {
            println!("     📄 row {}: {}", row, identifier);
        }
    }

    println!("\n✅ Dry run complete. Nothing was written.");
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from fairsweep.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
