//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account identifiers and balance maps
//! - `transaction`: Transactions, entries and fixed-point amount helpers
//! - `summary`: Result of a successful load
//! - `error`: Error types for the ledger loader

pub mod account;
pub mod error;
pub mod summary;
pub mod transaction;

pub use account::{AccountId, Balances};
pub use error::{
    CommandError, LoadError, ParseError, ParseErrorKind, StoreError, StoreErrorKind,
    ValidationError, ValidationErrorKind,
};
pub use summary::LoadSummary;
pub use transaction::{
    from_minor_units, to_minor_units, Entry, Transaction, TransactionId, AMOUNT_SCALE,
};
