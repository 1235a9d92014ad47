//! Error types for the ledger loader
//!
//! This module defines all error types that can occur while loading and
//! querying the ledger. Errors are designed to be descriptive and
//! user-friendly for CLI output.
//!
//! # Error Categories
//!
//! - [`ParseError`]: a CSV row does not match the column schema
//! - [`ValidationError`]: a parsed transaction breaks an accounting rule
//! - [`StoreError`]: the SQLite store failed or refused a write
//! - [`LoadError`]: the first of the above hit during a file load, plus
//!   file-level failures
//! - [`CommandError`]: anything a CLI command can fail with

use super::transaction::TransactionId;
use rusqlite::ErrorCode;
use std::fmt;
use thiserror::Error;

/// Kind of row-level parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Date is not a valid `YYYY-MM-DD` date
    MalformedDate,
    /// Amount is not a decimal, or exceeds the fixed-point range
    MalformedAmount,
    /// A required column is absent or has no value
    MissingColumn,
    /// An account column is present but blank
    EmptyAccount,
    /// The CSV layer could not decode the record
    MalformedRow,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseErrorKind::MalformedDate => "MalformedDate",
            ParseErrorKind::MalformedAmount => "MalformedAmount",
            ParseErrorKind::MissingColumn => "MissingColumn",
            ParseErrorKind::EmptyAccount => "EmptyAccount",
            ParseErrorKind::MalformedRow => "MalformedRow",
        };
        f.write_str(name)
    }
}

/// A CSV row could not be turned into a transaction
///
/// `row` is the 1-based data row; 0 designates the header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at row {row}: {detail}")]
pub struct ParseError {
    pub row: u64,
    pub kind: ParseErrorKind,
    pub detail: String,
}

impl ParseError {
    pub fn new(row: u64, kind: ParseErrorKind, detail: impl Into<String>) -> Self {
        ParseError {
            row,
            kind,
            detail: detail.into(),
        }
    }
}

/// Kind of accounting-rule violation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The transaction has no entries at all
    EmptyTransaction,
    /// Entry amounts do not sum to exactly zero
    Unbalanced,
    /// An entry carries a zero amount
    ZeroAmountEntry,
    /// The transaction id is already committed (or staged earlier in the same load)
    DuplicateTransaction,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationErrorKind::EmptyTransaction => "EmptyTransaction",
            ValidationErrorKind::Unbalanced => "Unbalanced",
            ValidationErrorKind::ZeroAmountEntry => "ZeroAmountEntry",
            ValidationErrorKind::DuplicateTransaction => "DuplicateTransaction",
        };
        f.write_str(name)
    }
}

/// A parsed transaction violates an accounting invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} for transaction {transaction_id}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub transaction_id: TransactionId,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, transaction_id: TransactionId) -> Self {
        ValidationError {
            kind,
            transaction_id,
        }
    }
}

/// Kind of persistence failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The database could not be opened, read or locked in time
    ConnectionLost,
    /// A primary or unique key already exists
    DuplicateKey,
    /// Any other constraint (check, foreign key, not null) was violated
    ConstraintViolation,
    /// The ledger tables have not been created
    SchemaMissing,
    /// Any other SQLite failure
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreErrorKind::ConnectionLost => "ConnectionLost",
            StoreErrorKind::DuplicateKey => "DuplicateKey",
            StoreErrorKind::ConstraintViolation => "ConstraintViolation",
            StoreErrorKind::SchemaMissing => "SchemaMissing",
            StoreErrorKind::Other => "Other",
        };
        f.write_str(name)
    }
}

/// The persistence store failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("store error ({kind}): {message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        StoreError {
            kind,
            message: message.into(),
        }
    }

    /// Create a SchemaMissing error for the given database location
    pub fn schema_missing(location: &str) -> Self {
        StoreError::new(
            StoreErrorKind::SchemaMissing,
            format!(
                "no ledger tables in {}, create them with `create-db` first",
                location
            ),
        )
    }
}

// Conversion from rusqlite::Error to StoreError, classified by SQLite result code
impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        let kind = match &error {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                ErrorCode::ConstraintViolation => match failure.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => StoreErrorKind::DuplicateKey,
                    _ => StoreErrorKind::ConstraintViolation,
                },
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt => StoreErrorKind::ConnectionLost,
                _ => StoreErrorKind::Other,
            },
            _ => StoreErrorKind::Other,
        };

        StoreError {
            kind,
            message: error.to_string(),
        }
    }
}

/// A file load failed; nothing from the file was committed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// Input file not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error while reading the input file
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// A row did not match the column schema
    #[error("Parse failed: {0}")]
    ParseFailed(ParseError),

    /// A row broke an accounting rule
    #[error("Validation failed at row {row}: {error}")]
    ValidationFailed {
        /// 1-based data row of the offending transaction
        row: u64,
        /// The violated rule
        error: ValidationError,
    },

    /// The store failed while staging or committing
    #[error("Store failed: {0}")]
    StoreFailed(#[from] StoreError),

    /// A background parsing task failed (async strategy only)
    #[error("Worker failed: {message}")]
    Worker {
        /// Description of the task failure
        message: String,
    },
}

// Conversion from io::Error to LoadError
impl From<std::io::Error> for LoadError {
    fn from(error: std::io::Error) -> Self {
        LoadError::Io {
            message: error.to_string(),
        }
    }
}

impl LoadError {
    /// Create a FileNotFound error
    pub fn file_not_found(path: &std::path::Path) -> Self {
        LoadError::FileNotFound {
            path: path.display().to_string(),
        }
    }

    /// Classify a failure to open the input file
    pub fn open_failed(path: &std::path::Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            LoadError::file_not_found(path)
        } else {
            LoadError::Io {
                message: format!("Failed to open file '{}': {}", path.display(), error),
            }
        }
    }

    /// Create a ValidationFailed error
    pub fn validation_failed(row: u64, error: ValidationError) -> Self {
        LoadError::ValidationFailed { row, error }
    }

    /// Row the load failed at, if the failure is attributable to one
    pub fn row(&self) -> Option<u64> {
        match self {
            LoadError::ParseFailed(error) => Some(error.row),
            LoadError::ValidationFailed { row, .. } => Some(*row),
            _ => None,
        }
    }
}

/// Anything a CLI command can fail with
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Failed to write output: {0}")]
    Output(String),
}

// Conversion from csv::Error to CommandError (output side only)
impl From<csv::Error> for CommandError {
    fn from(error: csv::Error) -> Self {
        CommandError::Output(error.to_string())
    }
}

impl From<std::io::Error> for CommandError {
    fn from(error: std::io::Error) -> Self {
        CommandError::Output(error.to_string())
    }
}
