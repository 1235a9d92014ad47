//! Core ledger logic module
//!
//! This module contains the ledger components:
//! - `traits` - Write-side abstraction over the store
//! - `validator` - Accounting rules for a parsed transaction
//! - `store` - SQLite persistence and the atomic load unit
//! - `engine` - Ingestion coordinator (one file, one atomic unit)
//! - `balances` - Per-account balance aggregation

pub mod balances;
pub mod engine;
pub mod store;
pub mod traits;
pub mod validator;

pub use balances::{get_balance, get_balances, get_balances_as_of};
pub use engine::{load_file, LoadSession};
pub use store::{LoadUnit, SqliteStore, StoreConfig};
pub use traits::LedgerWriter;
