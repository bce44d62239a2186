//! balrecon CLI binary.
//!
//! Reconciles two client balance snapshots from the command line.

mod cmd;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cmd::{GroupBy, RankBy};

#[derive(Parser)]
#[command(name = "balrecon")]
#[command(about = "Client balance reconciliation between two snapshots", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Clients in each top and bottom view
    #[arg(long, global = true)]
    top: Option<usize>,

    /// Interest rate below which a client is on the Special fee tier
    #[arg(long, global = true)]
    fee_threshold: Option<f64>,

    /// Business date of the previous snapshot (YYYY-MM-DD, defaults to the file name)
    #[arg(long, global = true)]
    previous_date: Option<String>,

    /// Business date of the current snapshot (YYYY-MM-DD, defaults to the file name)
    #[arg(long, global = true)]
    current_date: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full report: client table, summaries, rankings and histograms
    Compare {
        /// Previous snapshot export
        previous: PathBuf,

        /// Current snapshot export
        current: PathBuf,

        /// Also write the downloadable table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also write the report as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Leave the per-client table out of the terminal report
        #[arg(long)]
        no_table: bool,
    },

    /// Grouped totals
    Groups {
        /// Previous snapshot export
        previous: PathBuf,

        /// Current snapshot export
        current: PathBuf,

        /// Grouping
        #[arg(short, long, value_enum, default_value = "channel")]
        by: GroupBy,
    },

    /// Top and bottom clients
    Rank {
        /// Previous snapshot export
        previous: PathBuf,

        /// Current snapshot export
        current: PathBuf,

        /// Value to rank on
        #[arg(short, long, value_enum, default_value = "change")]
        by: RankBy,

        /// Channel group (IPOT, WM, Private Dealing, Others)
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Distribution of change magnitudes
    Histogram {
        /// Previous snapshot export
        previous: PathBuf,

        /// Current snapshot export
        current: PathBuf,

        /// Channel group (IPOT, WM, Private Dealing, Others)
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Logs go to stderr so report output on stdout stays clean.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("balrecon={level},warn")));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose > 0);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let ctx = cmd::Context::from_args(cmd::GlobalArgs {
        config: cli.config,
        top: cli.top,
        fee_threshold: cli.fee_threshold,
        previous_date: cli.previous_date,
        current_date: cli.current_date,
    })?;

    match cli.command {
        Commands::Compare {
            previous,
            current,
            csv,
            json,
            no_table,
        } => {
            cmd::compare::run(&ctx, &previous, &current, csv, json, no_table)?;
        }
        Commands::Groups {
            previous,
            current,
            by,
        } => {
            cmd::groups::run(&ctx, &previous, &current, by)?;
        }
        Commands::Rank {
            previous,
            current,
            by,
            group,
        } => {
            cmd::rank::run(&ctx, &previous, &current, by, group.as_deref())?;
        }
        Commands::Histogram {
            previous,
            current,
            group,
        } => {
            cmd::histogram::run(&ctx, &previous, &current, group.as_deref())?;
        }
        Commands::Config => {
            cmd::config::run(&ctx)?;
        }
    }

    Ok(())
}
