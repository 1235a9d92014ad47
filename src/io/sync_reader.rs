//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over parsed transactions from a ledger CSV
//! file. Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The SyncReader uses csv::Reader to read records sequentially, resolving the
//! column schema from the header once and handing each row to the record
//! parser. It maintains streaming behavior by processing records one at a time
//! without loading the entire file into memory.
//!
//! ```no_run
//! use ledger_loader::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::open(Path::new("ledger.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(transaction) => println!("Parsed transaction {}", transaction.id),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - File-level errors (file not found, header missing a column) are returned from `open()`
//! - Row errors are yielded as Err variants carrying the row number

use crate::io::csv_format::{parse_row, ColumnSchema, RawRow};
use crate::io::{RowReadError, SourceFile};
use crate::types::{LoadError, Transaction};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::path::Path;

impl RowReadError for csv::Error {
    fn is_io(&self) -> bool {
        self.is_io_error()
    }
}

/// Synchronous CSV reader
///
/// Iterates over the data rows of one file, yielding one parsed
/// [`Transaction`] (or the row's error) per row, in file order.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    schema: ColumnSchema,
    source: SourceFile,
    record: StringRecord,
    row: u64,
}

impl SyncReader {
    /// Open a ledger CSV file and resolve its column schema
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (optional trailing columns)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Errors
    ///
    /// * `LoadError::FileNotFound` if the file does not exist
    /// * `LoadError::Io` if it cannot be read
    /// * `LoadError::ParseFailed` at row 0 if the header lacks a required column
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let source = SourceFile::read(path)?;
        let file = File::open(path).map_err(|e| LoadError::open_failed(path, e))?;

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| e.into_load_error(0))?;
        let schema = ColumnSchema::from_headers(headers.iter()).map_err(LoadError::ParseFailed)?;

        Ok(Self {
            reader,
            schema,
            source,
            record: StringRecord::new(),
            row: 0,
        })
    }

    /// Name and content fingerprint of the file being read
    pub fn source(&self) -> &SourceFile {
        &self.source
    }
}

impl Iterator for SyncReader {
    type Item = Result<Transaction, LoadError>;

    /// Read and parse the next data row
    ///
    /// # Returns
    ///
    /// * `Some(Ok(Transaction))` - Successfully parsed row
    /// * `Some(Err(LoadError))` - Parse or read error for this row
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                self.row += 1;
                let raw = RawRow::new(self.row, self.record.iter().map(str::to_string).collect());
                Some(parse_row(&self.schema, &raw, &self.source).map_err(LoadError::ParseFailed))
            }
            Err(e) => {
                self.row += 1;
                Some(Err(e.into_load_error(self.row)))
            }
        }
    }
}
