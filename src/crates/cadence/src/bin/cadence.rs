//! Cadence CLI - tracker sync and delivery metrics reports
//!
//! Main entry point for the cadence command-line tool.

use cadence::cli;
use cadence::sync::SyncOptions;
use cadence::version::full_version;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Tracker sync and delivery-lifecycle metrics", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync tasks and status history from the remote tracker
    Sync {
        /// Tracker query filter, passed through verbatim
        #[arg(long)]
        filter: String,

        /// Maximum number of tasks to sync
        #[arg(long)]
        limit: Option<usize>,

        /// Skip changelog fetch and history replacement
        #[arg(long)]
        skip_history: bool,

        /// Force full history replay (explicit intent; same as default)
        #[arg(long)]
        force_full_history: bool,
    },

    /// Generate the per-task delivery metrics CSV
    TtmDetails {
        /// Output CSV path (default: timestamped file in the reports dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Optional quarter-aggregated CSV path
        #[arg(long)]
        aggregate_output: Option<PathBuf>,

        /// Freeze the clock at this date (YYYY-MM-DD) for open intervals
        #[arg(long)]
        as_of: Option<String>,

        /// Grouping dimension: author or team
        #[arg(long, default_value = "author")]
        group_by: String,
    },

    /// Generate per-root downstream return counts
    FullstackSubepicReturns {
        /// Output CSV path (default: timestamped file in the reports dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Only roots created on or after this date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
    },

    /// Generate the per-task time-in-status CSV for one queue
    StatusTime {
        /// Queue prefix, e.g. CPO
        #[arg(long)]
        queue: String,

        /// Only tasks created on or after this date (YYYY-MM-DD)
        #[arg(long)]
        created_since: Option<String>,

        /// Output CSV path (default: timestamped file in the reports dir)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Sync {
            filter,
            limit,
            skip_history,
            force_full_history,
        } => {
            cli::run_sync(SyncOptions {
                filter,
                limit,
                skip_history,
                force_full_history,
            })
            .await
        }
        Commands::TtmDetails {
            output,
            aggregate_output,
            as_of,
            group_by,
        } => cli::run_ttm_details(output, aggregate_output, as_of, group_by).await,
        Commands::FullstackSubepicReturns { output, start_date } => {
            cli::run_subepic_returns(output, start_date).await
        }
        Commands::StatusTime {
            queue,
            created_since,
            output,
        } => cli::run_status_time(queue, created_since, output).await,
        Commands::Version => {
            println!("{}", full_version());
            Ok(())
        }
    };

    if let Err(error) = result {
        eprintln!("{}", error);
        std::process::exit(error.exit_code());
    }
}
