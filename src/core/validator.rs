//! Ledger validation
//!
//! Checks accounting invariants on a parsed transaction. Validation is pure:
//! whether the transaction id is already committed is looked up by the caller
//! and passed in.
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. the transaction has at least one entry
//! 2. entry amounts sum to exactly zero
//! 3. no entry has a zero amount
//! 4. the id is not already committed

use crate::types::{Transaction, ValidationError, ValidationErrorKind};

/// Validate a transaction against every ledger rule
pub fn validate(transaction: &Transaction, already_committed: bool) -> Result<(), ValidationError> {
    check_entries(transaction)?;

    if already_committed {
        return Err(fail(transaction, ValidationErrorKind::DuplicateTransaction));
    }

    Ok(())
}

/// Check the rules that depend on the transaction alone
pub fn check_entries(transaction: &Transaction) -> Result<(), ValidationError> {
    if transaction.entries.is_empty() {
        return Err(fail(transaction, ValidationErrorKind::EmptyTransaction));
    }

    // Amounts are fixed-point, so the sum must be exactly zero
    if !transaction.net_amount().is_zero() {
        return Err(fail(transaction, ValidationErrorKind::Unbalanced));
    }

    if transaction.entries.iter().any(|entry| entry.amount.is_zero()) {
        return Err(fail(transaction, ValidationErrorKind::ZeroAmountEntry));
    }

    Ok(())
}

fn fail(transaction: &Transaction, kind: ValidationErrorKind) -> ValidationError {
    ValidationError::new(kind, transaction.id.clone())
}
