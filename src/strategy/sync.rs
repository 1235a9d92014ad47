//! Synchronous load strategy
//!
//! Reads, parses and stages one row at a time on the calling thread. Memory
//! use is constant in the file size; the only thing that grows is the open
//! SQLite transaction itself.

use crate::core::{LoadSession, SqliteStore};
use crate::io::sync_reader::SyncReader;
use crate::strategy::LoadStrategy;
use crate::types::{LoadError, LoadSummary};
use std::path::Path;

/// Synchronous load strategy
///
/// ```no_run
/// use ledger_loader::core::{SqliteStore, StoreConfig};
/// use ledger_loader::strategy::{LoadStrategy, SyncLoadStrategy};
/// use std::path::Path;
///
/// let mut store = SqliteStore::open(Path::new("db.sqlite3"), &StoreConfig::default()).unwrap();
/// let summary = SyncLoadStrategy.load(&mut store, Path::new("ledger.csv")).unwrap();
/// println!("{}", summary);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncLoadStrategy;

impl LoadStrategy for SyncLoadStrategy {
    fn load(&self, store: &mut SqliteStore, input_path: &Path) -> Result<LoadSummary, LoadError> {
        let reader = SyncReader::open(input_path)?;
        let mut session = LoadSession::begin(store, &reader.source().name)?;

        for result in reader {
            session.stage(result?)?;
        }

        session.finish()
    }
}
