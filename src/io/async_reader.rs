//! Asynchronous CSV reader with batch interface
//!
//! Reads raw ledger rows from a CSV file in batches for the async load
//! strategy. Parsing is left to the caller so that batches can be parsed on
//! worker tasks while the next batch is being read.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of RawRow results
//!                  ↓
//!           csv_format module
//!           (ColumnSchema, parse_row)
//! ```

use crate::io::csv_format::{ColumnSchema, RawRow};
use crate::io::RowReadError;
use crate::types::LoadError;
use csv_async::{AsyncReaderBuilder, StringRecord};
use futures::io::AsyncRead;

impl RowReadError for csv_async::Error {
    fn is_io(&self) -> bool {
        self.is_io_error()
    }
}

/// Asynchronous CSV reader
///
/// Yields batches of raw rows numbered from 1. A read failure is delivered in
/// place of the row it occurred at and ends the stream, so rows before it are
/// never lost.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncReader<R>,
    schema: ColumnSchema,
    row: u64,
    finished: bool,
}

impl<R: AsyncRead + Unpin + Send> AsyncReader<R> {
    /// Create a new AsyncReader and resolve the column schema from the header
    ///
    /// # Errors
    ///
    /// * `LoadError::ParseFailed` at row 0 if the header lacks a required column
    /// * `LoadError::Io` if the header cannot be read
    pub async fn new(reader: R) -> Result<Self, LoadError> {
        let mut csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_reader(reader);

        let headers = csv_reader
            .headers()
            .await
            .map_err(|e| e.into_load_error(0))?;
        let schema = ColumnSchema::from_headers(headers.iter()).map_err(LoadError::ParseFailed)?;

        Ok(Self {
            csv_reader,
            schema,
            row: 0,
            finished: false,
        })
    }

    /// Column schema resolved from the header
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Read up to `batch_size` rows
    ///
    /// Returns an empty vector once the end of the file (or a read failure)
    /// has been reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Result<RawRow, LoadError>> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut record = StringRecord::new();

        while !self.finished && batch.len() < batch_size {
            match self.csv_reader.read_record(&mut record).await {
                Ok(true) => {
                    self.row += 1;
                    batch.push(Ok(RawRow::new(
                        self.row,
                        record.iter().map(str::to_string).collect(),
                    )));
                }
                Ok(false) => self.finished = true,
                Err(e) => {
                    self.row += 1;
                    self.finished = true;
                    batch.push(Err(e.into_load_error(self.row)));
                }
            }
        }

        batch
    }
}
