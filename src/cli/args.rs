use crate::core::StoreConfig;
use crate::strategy::BatchConfig;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Load double-entry ledger CSV files into SQLite and report balances
#[derive(Parser, Debug)]
#[command(name = "ledger-loader")]
#[command(about = "Load double-entry ledger CSV files into SQLite and report balances", long_about = None)]
pub struct CliArgs {
    /// SQLite database file
    #[arg(
        long = "db",
        value_name = "PATH",
        env = "LEDGER_DB",
        default_value = "db.sqlite3",
        global = true
    )]
    pub db_path: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// How long to wait for another connection's lock, in milliseconds
    #[arg(
        long = "busy-timeout-ms",
        value_name = "MS",
        default_value_t = 5000,
        global = true
    )]
    pub busy_timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the ledger tables
    CreateDb,

    /// Drop the ledger tables and all loaded data
    DropDb,

    /// Load one CSV file as a single atomic unit
    Load(LoadArgs),

    /// Print the net balance of every account as CSV
    Balances {
        /// Only count transactions dated on or before this day (YYYY-MM-DD)
        #[arg(value_name = "END_DATE")]
        end_date: Option<NaiveDate>,
    },
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Ledger CSV file to load
    #[arg(value_name = "INPUT", help = "Path to the ledger CSV file")]
    pub input_file: PathBuf,

    /// Load strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Load strategy: 'sync' for synchronous or 'async' for batched parsing"
    )]
    pub strategy: StrategyType,

    /// Number of rows per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of rows per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of concurrent batches (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of batches parsed ahead of the writer (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,
}

/// Available load strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Store settings from the global flags
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

impl LoadArgs {
    /// Create a BatchConfig from the load flags, filling gaps with defaults
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }
}
