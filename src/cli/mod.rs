// CLI module
// Command-line interface, argument parsing and command dispatch

mod args;

pub use args::{CliArgs, Command, LoadArgs, StrategyType};

use crate::core::{get_balances, get_balances_as_of, load_file, SqliteStore};
use crate::io::write_balances_csv;
use crate::strategy::create_strategy;
use crate::types::CommandError;
use clap::Parser;
use env_logger::Env;
use std::io::Write;

/// Parse command-line arguments using clap
///
/// On invalid arguments or `--help`, clap prints the message and exits.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Initialise logging to stderr
///
/// `RUST_LOG` takes precedence; otherwise `--debug` selects the debug level
/// and the default is warnings only.
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();
}

/// Run one command against the database named in `args`
///
/// The store is opened for the duration of the command and closed on return.
/// Human-readable results go to `output`.
pub fn run(args: &CliArgs, output: &mut dyn Write) -> Result<(), CommandError> {
    let mut store = SqliteStore::open(&args.db_path, &args.store_config())?;

    match &args.command {
        Command::CreateDb => {
            if store.create_schema()? {
                writeln!(output, "Initialized database at {}", store.location())?;
            } else {
                writeln!(output, "Database already exists at {}", store.location())?;
            }
        }
        Command::DropDb => {
            if store.drop_schema()? {
                writeln!(output, "Dropped ledger tables at {}", store.location())?;
            } else {
                writeln!(output, "No ledger tables at {}", store.location())?;
            }
        }
        Command::Load(load) => {
            let strategy = create_strategy(load.strategy.clone(), Some(load.to_batch_config()));
            let summary = load_file(&mut store, &load.input_file, strategy.as_ref())?;
            writeln!(output, "{}", summary)?;
        }
        Command::Balances { end_date } => {
            let balances = match end_date {
                Some(end_date) => get_balances_as_of(&store, *end_date)?,
                None => get_balances(&store)?,
            };
            write_balances_csv(&balances, output)?;
        }
    }

    Ok(())
}
