//! Result of a successful file load

use super::account::AccountId;
use super::transaction::TransactionId;
use std::collections::BTreeSet;
use std::fmt;

/// Summary of a committed file load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// File name the rows were read from
    pub source: String,

    /// Number of data rows committed
    pub rows_loaded: u64,

    /// Every account referenced by the committed rows
    pub accounts_touched: BTreeSet<AccountId>,

    /// Committed transaction identifiers, in row order
    pub transaction_ids: Vec<TransactionId>,
}

impl LoadSummary {
    pub fn new(source: impl Into<String>) -> Self {
        LoadSummary {
            source: source.into(),
            ..Default::default()
        }
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loaded {} transactions touching {} accounts from {}",
            self.rows_loaded,
            self.accounts_touched.len(),
            self.source
        )
    }
}
