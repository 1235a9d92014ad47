//! Account-related types for the ledger
//!
//! Accounts have no state of their own beyond their identifier: they are
//! created implicitly the first time an entry references them, and their
//! balance is always derived from committed entries.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

/// Account identifier
///
/// Always non-empty and free of surrounding whitespace. The identifier is the
/// account's only key and never changes once an account exists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account identifier
    ///
    /// Surrounding whitespace is trimmed. Returns `None` if nothing is left.
    pub fn new(id: impl AsRef<str>) -> Option<Self> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            None
        } else {
            Some(AccountId(id.to_string()))
        }
    }

    /// Wrap an identifier read back from the store, where the schema already
    /// guarantees it is non-empty.
    pub(crate) fn from_stored(id: String) -> Self {
        AccountId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Net balance per account, ordered by account identifier
pub type Balances = BTreeMap<AccountId, Decimal>;
