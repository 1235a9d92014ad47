//! Transaction-related types for the ledger
//!
//! This module defines transactions, their entries and the fixed-point
//! conventions used for amounts throughout the system.

use super::account::AccountId;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;

/// Number of decimal places an amount may carry
pub const AMOUNT_SCALE: u32 = 4;

/// Minor units per whole unit (10^AMOUNT_SCALE)
const MINOR_UNITS_PER_UNIT: i64 = 10_000;

/// Transaction identifier
///
/// Either the external id supplied by the source file or one derived from the
/// file's content fingerprint and row number. Unique across the ledger's lifetime, which is
/// what makes reloading a file detectable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create a transaction identifier from an explicit external id
    ///
    /// Returns `None` for a blank id.
    pub fn new(id: impl AsRef<str>) -> Option<Self> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            None
        } else {
            Some(TransactionId(id.to_string()))
        }
    }

    /// Derive an identifier from a file content fingerprint and 1-based row number
    pub fn derived(fingerprint: &str, row: u64) -> Self {
        TransactionId(format!("{}:{}", fingerprint, row))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One signed amount against one account
///
/// Positive amounts are debits, negative amounts are credits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub account: AccountId,
    pub amount: Decimal,
}

impl Entry {
    pub fn new(account: AccountId, amount: Decimal) -> Self {
        Entry { account, amount }
    }
}

/// A single economic event
///
/// Built once by the record parser and never mutated after it has been
/// committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: TransactionId,

    /// Date the event took place
    pub date: NaiveDate,

    /// Free-text description, possibly empty
    pub description: String,

    /// Name of the file the transaction was read from
    pub source: String,

    /// 1-based data row within `source` (the header is not counted)
    pub row: u64,

    /// Ordered entries; their amounts must sum to zero
    pub entries: Vec<Entry>,
}

impl Transaction {
    /// Sum of all entry amounts
    pub fn net_amount(&self) -> Decimal {
        self.entries.iter().map(|entry| entry.amount).sum()
    }

    /// Accounts referenced by this transaction, in entry order
    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.entries.iter().map(|entry| &entry.account)
    }
}

/// Convert an amount to integer minor units
///
/// Returns `None` if the amount carries more than [`AMOUNT_SCALE`] decimal
/// places or does not fit in an `i64` once scaled.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    if amount.normalize().scale() > AMOUNT_SCALE {
        return None;
    }
    amount
        .checked_mul(Decimal::from(MINOR_UNITS_PER_UNIT))?
        .trunc()
        .to_i64()
}

/// Convert integer minor units back to an amount with [`AMOUNT_SCALE`] places
pub fn from_minor_units(units: i64) -> Decimal {
    Decimal::new(units, AMOUNT_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    fn account(id: &str) -> AccountId {
        AccountId::new(id).unwrap()
    }

    #[rstest]
    #[case::whole("100", Some(1_000_000))]
    #[case::four_places("0.0001", Some(1))]
    #[case::trailing_zeros_beyond_scale("1.500000", Some(15_000))]
    #[case::negative("-12.34", Some(-123_400))]
    #[case::too_precise("0.00001", None)]
    #[case::too_large("99999999999999999999", None)]
    fn test_to_minor_units(#[case] amount: &str, #[case] expected: Option<i64>) {
        assert_eq!(to_minor_units(Decimal::from_str(amount).unwrap()), expected);
    }

    #[test]
    fn test_from_minor_units_keeps_value() {
        assert_eq!(from_minor_units(1_500_000), Decimal::from(150));
        assert_eq!(from_minor_units(-1), Decimal::from_str("-0.0001").unwrap());
    }

    #[test]
    fn test_derived_transaction_id() {
        assert_eq!(TransactionId::derived("9f86d081884c7d65", 7).as_str(), "9f86d081884c7d65:7");
    }

    #[test]
    fn test_blank_transaction_id_rejected() {
        assert!(TransactionId::new("  ").is_none());
        assert_eq!(TransactionId::new(" ext-1 ").unwrap().as_str(), "ext-1");
    }

    #[test]
    fn test_net_amount_and_accounts() {
        let tx = Transaction {
            id: TransactionId::derived("f.csv", 1),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            description: String::new(),
            source: "f.csv".to_string(),
            row: 1,
            entries: vec![
                Entry::new(account("A"), Decimal::from(50)),
                Entry::new(account("B"), Decimal::from(-30)),
            ],
        };

        assert_eq!(tx.net_amount(), Decimal::from(20));
        let accounts: Vec<_> = tx.accounts().map(AccountId::as_str).collect();
        assert_eq!(accounts, vec!["A", "B"]);
    }
}
