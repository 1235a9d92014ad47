//! Core traits for ledger persistence
//!
//! This module defines the write-side abstraction shared by the autocommit
//! store and the atomic load unit, so that the ingestion coordinator stages
//! rows the same way regardless of where they end up.

use crate::types::{AccountId, StoreError, Transaction, TransactionId};

/// Trait for writing accounts and transactions to the ledger
///
/// Implemented by [`SqliteStore`](crate::core::store::SqliteStore), where every
/// call is its own atomic write, and by [`LoadUnit`](crate::core::store::LoadUnit),
/// where writes become visible only when the unit commits.
pub trait LedgerWriter {
    /// Create the account if it does not exist yet; idempotent
    fn ensure_account(&self, id: &AccountId) -> Result<(), StoreError>;

    /// Whether a transaction with this id is already written
    fn is_committed(&self, id: &TransactionId) -> Result<bool, StoreError>;

    /// Write a transaction and its entries as one atomic unit
    ///
    /// Fails with `DuplicateKey` if the id exists and with
    /// `ConstraintViolation` if an entry references an unknown account.
    fn commit_transaction(&self, transaction: &Transaction) -> Result<(), StoreError>;
}
