//! CLI entry point for the hanna rebalancer.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use hanna_broker::Broker;
use log::warn;

use hanna_rebalancer::allocation::AllocationSpec;
use hanna_rebalancer::broker::connect_snapshot;
use hanna_rebalancer::config::Config;
use hanna_rebalancer::error::{Error, Result};
use hanna_rebalancer::execution::{self, RunOptions};

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Deposit rebalancer: spend cash in whole shares toward target allocations")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan the deposit, confirm, and place the orders
    Run {
        /// Path to portfolio.json
        allocation: PathBuf,

        /// Show plan without executing
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt (for automation/cron)
        #[arg(long)]
        force: bool,

        /// Deposit this amount instead of the available cash
        #[arg(long)]
        amount: Option<f64>,
    },

    /// Show the deposit plan only
    Plan {
        /// Path to portfolio.json
        allocation: PathBuf,

        /// Deposit this amount instead of the available cash
        #[arg(long)]
        amount: Option<f64>,
    },

    /// Show account and current allocation
    Status {
        /// Path to portfolio.json
        allocation: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = dispatch(&config, cli.command) {
        match &e {
            Error::Aborted(msg) => {
                eprintln!("{msg}");
                process::exit(0);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}

fn load_allocation(path: &Path) -> AllocationSpec {
    match AllocationSpec::load(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading allocation: {e}");
            process::exit(1);
        }
    }
}

fn dispatch(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Run {
            allocation,
            dry_run,
            force,
            amount,
        } => {
            let spec = load_allocation(&allocation);
            let mut broker = connect_snapshot(config)?;
            let opts = RunOptions {
                dry_run,
                force,
                amount,
                allocation_file: allocation.display().to_string(),
            };
            let summary = execution::run(config, &spec, &broker, &opts)?;
            if summary.filled > 0 && config.broker.save_fills {
                broker.save()?;
            }
            if let Err(e) = broker.disconnect() {
                warn!("Disconnect failed: {e}");
            }
            Ok(())
        }
        Command::Plan { allocation, amount } => {
            let spec = load_allocation(&allocation);
            let broker = connect_snapshot(config)?;
            execution::show_plan(&spec, &broker, amount)
        }
        Command::Status { allocation } => {
            let spec = load_allocation(&allocation);
            print!("Loading snapshot {}... ", config.broker.snapshot.display());
            let broker = connect_snapshot(config)?;
            println!("OK");
            execution::check_status(config, &spec, &broker)
        }
    }
}
