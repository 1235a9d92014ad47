//! Load strategy module
//!
//! This module defines the Strategy pattern for the read-and-parse half of a
//! file load. Both strategies feed rows into the same
//! [`LoadSession`](crate::core::LoadSession) strictly in file order, so they
//! commit the same rows and fail on the same row with the same error.
//! They differ only in how reading and parsing are scheduled.

use crate::cli::StrategyType;
use crate::core::SqliteStore;
use crate::types::{LoadError, LoadSummary};
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncLoadStrategy, BatchConfig};
pub use sync::SyncLoadStrategy;

/// Load strategy trait for one CSV file
pub trait LoadStrategy: Send + Sync {
    /// Read every row of `input_path` and stage it into one load session
    ///
    /// # Arguments
    ///
    /// * `store` - Open store with the ledger schema in place
    /// * `input_path` - Path to the ledger CSV file
    ///
    /// # Returns
    ///
    /// * `Ok(LoadSummary)` once every row is committed
    /// * `Err(LoadError)` for the first failing row; nothing is committed
    fn load(&self, store: &mut SqliteStore, input_path: &Path) -> Result<LoadSummary, LoadError>;
}

/// Create a load strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of load strategy to create (Sync or Async)
/// * `config` - Optional batch configuration (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn LoadStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncLoadStrategy),
        StrategyType::Async => Box::new(AsyncLoadStrategy::new(config.unwrap_or_default())),
    }
}
