//! Ledger Loader Library
//! # Overview
//!
//! This library loads double-entry ledger rows from CSV files into a SQLite
//! database, one file per atomic unit, and derives account balances from the
//! committed entries.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (AccountId, Transaction, errors, etc.)
//! - [`cli`] - CLI argument parsing and command dispatch
//! - [`io`] - CSV record parsing, sync and async readers, balance output
//! - [`core`] - Ledger logic:
//!   - [`core::validator`] - Accounting rules for one transaction
//!   - [`core::store`] - SQLite persistence and the atomic load unit
//!   - [`core::engine`] - Ingestion coordinator
//!   - [`core::balances`] - Balance aggregation
//! - [`strategy`] - Sync and async load pipelines
//!
//! # Row Format
//!
//! Each CSV row is one transaction with two entries:
//!
//! - `+amount` on `account`
//! - `-counter_amount` on `counter_account` (`counter_amount` defaults to `amount`)
//!
//! A transaction is accepted only if its entries sum to exactly zero, none is
//! zero, and its id has not been loaded before.
//!
//! # Load Semantics
//!
//! A file is loaded in full or not at all. The first row that fails to parse,
//! validate or store rolls the whole file back, and the error names the row.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{get_balance, get_balances, get_balances_as_of, load_file, SqliteStore, StoreConfig};
pub use io::write_balances_csv;
pub use types::{
    AccountId, Balances, Entry, LoadError, LoadSummary, Transaction, TransactionId,
};
