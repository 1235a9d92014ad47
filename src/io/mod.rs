//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (column schema, record parser, balance output)
//! - `sync_reader` - Synchronous CSV reader with iterator interface
//! - `async_reader` - Asynchronous CSV reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{parse_row, write_balances_csv, ColumnSchema, RawRow};
pub use sync_reader::SyncReader;

use crate::types::{LoadError, ParseError, ParseErrorKind};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;

/// Hex digits of the content digest kept in derived transaction ids
const FINGERPRINT_LEN: usize = 16;

/// Identity of one input file
///
/// `name` is what messages and the `transactions.source` column show.
/// `fingerprint` is a SHA-256 digest of the file content and is what derived
/// transaction ids are built from, so the same content collides on reload
/// from any path while different files sharing a name do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub fingerprint: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        SourceFile {
            name: name.into(),
            fingerprint: fingerprint.into(),
        }
    }

    /// Name a file and fingerprint its content
    ///
    /// The file is streamed through the hasher, never held in memory.
    ///
    /// # Errors
    ///
    /// * `LoadError::FileNotFound` if the file does not exist
    /// * `LoadError::Io` if it cannot be read
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let mut file = File::open(path).map_err(|e| LoadError::open_failed(path, e))?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;

        let mut fingerprint = format!("{:x}", hasher.finalize());
        fingerprint.truncate(FINGERPRINT_LEN);

        Ok(SourceFile::new(source_name(path), fingerprint))
    }
}

/// File name used as the source of a load, falling back to the whole path
fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Record-level failure reported by either CSV backend
pub(crate) trait RowReadError: std::fmt::Display {
    fn is_io(&self) -> bool;

    /// I/O failures abort the load as such; anything else is a malformed row
    fn into_load_error(self, row: u64) -> LoadError
    where
        Self: Sized,
    {
        if self.is_io() {
            LoadError::Io {
                message: self.to_string(),
            }
        } else {
            LoadError::ParseFailed(ParseError::new(
                row,
                ParseErrorKind::MalformedRow,
                self.to_string(),
            ))
        }
    }
}
