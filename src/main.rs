//! Ledger loader CLI
//!
//! Command-line interface for loading double-entry ledger CSV files into a
//! SQLite database and reporting account balances.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- create-db
//! cargo run -- load ledger.csv
//! cargo run -- load --strategy async --batch-size 2000 --max-concurrent 8 ledger.csv
//! cargo run -- balances > balances.csv
//! cargo run -- balances 2024-01-31
//! cargo run -- --db /tmp/other.sqlite3 drop-db
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing schema, file not found, rejected row, database busy, etc.)

use ledger_loader::cli;
use std::process;

fn main() {
    let args = cli::parse_args();
    cli::init_logging(args.debug);

    let mut output = std::io::stdout();
    if let Err(e) = cli::run(&args, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
