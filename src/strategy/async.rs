//! Asynchronous batch load strategy
//!
//! Reads the file in batches and parses each batch on a tokio worker task,
//! while the calling task keeps reading ahead. Parsed batches are awaited in
//! the order they were read and staged one row at a time, so the single
//! SQLite writer sees exactly the same sequence as the sync strategy.
//!
//! # Architecture
//!
//! ```text
//! AsyncLoadStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── worker tasks (parse_row over one batch each)
//!     └── LoadSession (in-order staging, one atomic unit)
//! ```
//!
//! At most `max_concurrent_batches` parsed or in-flight batches are held at
//! once, which bounds memory regardless of file size.

use crate::core::{LoadSession, SqliteStore};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::{parse_row, ColumnSchema, RawRow};
use crate::io::SourceFile;
use crate::strategy::LoadStrategy;
use crate::types::{LoadError, LoadSummary, Transaction};
use log::{debug, warn};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::compat::TokioAsyncReadCompatExt;

type ParsedBatch = Vec<Result<Transaction, LoadError>>;

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of rows per batch
    pub batch_size: usize,
    /// Maximum number of batches parsed ahead of the writer
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                "Invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches, default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch load strategy
///
/// Builds its own multi-threaded tokio runtime per load, with one worker
/// thread per concurrent batch.
#[derive(Debug, Clone)]
pub struct AsyncLoadStrategy {
    config: BatchConfig,
}

impl AsyncLoadStrategy {
    /// Create a new AsyncLoadStrategy with the specified configuration
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    async fn load_batches(
        &self,
        store: &mut SqliteStore,
        input_path: &Path,
        source: Arc<SourceFile>,
    ) -> Result<LoadSummary, LoadError> {
        let file = tokio::fs::File::open(input_path)
            .await
            .map_err(|e| LoadError::open_failed(input_path, e))?;
        let mut reader = AsyncReader::new(file.compat()).await?;

        let schema = Arc::new(reader.schema().clone());
        let mut session = LoadSession::begin(store, &source.name)?;
        let mut in_flight: VecDeque<JoinHandle<ParsedBatch>> = VecDeque::new();

        loop {
            let batch = reader.read_batch(self.config.batch_size).await;
            if batch.is_empty() {
                break;
            }

            debug!("Dispatching batch of {} rows", batch.len());
            let schema = Arc::clone(&schema);
            let source = Arc::clone(&source);
            in_flight.push_back(tokio::spawn(async move {
                parse_batch(&schema, &source, batch)
            }));

            if in_flight.len() >= self.config.max_concurrent_batches {
                if let Some(handle) = in_flight.pop_front() {
                    stage_batch(&mut session, handle).await?;
                }
            }
        }

        while let Some(handle) = in_flight.pop_front() {
            stage_batch(&mut session, handle).await?;
        }

        session.finish()
    }
}

impl LoadStrategy for AsyncLoadStrategy {
    fn load(&self, store: &mut SqliteStore, input_path: &Path) -> Result<LoadSummary, LoadError> {
        let source = Arc::new(SourceFile::read(input_path)?);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()?;

        // The session borrows the connection, so it stays on this thread;
        // only parsing moves to the workers.
        runtime.block_on(self.load_batches(store, input_path, source))
    }
}

fn parse_batch(
    schema: &ColumnSchema,
    source: &SourceFile,
    batch: Vec<Result<RawRow, LoadError>>,
) -> ParsedBatch {
    batch
        .into_iter()
        .map(|raw| {
            raw.and_then(|raw| parse_row(schema, &raw, source).map_err(LoadError::ParseFailed))
        })
        .collect()
}

async fn stage_batch(
    session: &mut LoadSession<'_>,
    handle: JoinHandle<ParsedBatch>,
) -> Result<(), LoadError> {
    let parsed = handle.await.map_err(|e| LoadError::Worker {
        message: e.to_string(),
    })?;

    for result in parsed {
        session.stage(result?)?;
    }

    Ok(())
}
