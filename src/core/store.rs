//! SQLite-backed persistence store
//!
//! The store exclusively owns the durable ledger rows:
//!
//! ```text
//! accounts      (id)
//! transactions  (id, date, description, source, row_number)
//! entries       (transaction_id, position, account_id, amount)
//! ```
//!
//! Amounts are stored as INTEGER minor units so that aggregates stay exact.
//! File databases run in WAL mode: a reader on another connection keeps
//! seeing the last committed state while a load is in progress.
//!
//! Connection-level failures are reported as `ConnectionLost` and are never
//! retried here.

use crate::core::traits::LedgerWriter;
use crate::io::csv_format::DATE_FORMAT;
use crate::types::{
    from_minor_units, to_minor_units, AccountId, Entry, StoreError, StoreErrorKind, Transaction,
    TransactionId,
};
use chrono::NaiveDate;
use log::info;
use rusqlite::{params, Connection, TransactionBehavior};
use rust_decimal::Decimal;
use std::path::Path;
use std::time::Duration;

const SCHEMA: &str = "
BEGIN;
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY NOT NULL CHECK (length(id) > 0)
);
CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY NOT NULL CHECK (length(id) > 0),
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    source TEXT NOT NULL,
    row_number INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS entries (
    transaction_id TEXT NOT NULL REFERENCES transactions(id),
    position INTEGER NOT NULL,
    account_id TEXT NOT NULL REFERENCES accounts(id),
    amount INTEGER NOT NULL CHECK (amount <> 0),
    PRIMARY KEY (transaction_id, position)
);
CREATE INDEX IF NOT EXISTS idx_entries_account ON entries(account_id);
COMMIT;
";

const DROP_SCHEMA: &str = "
BEGIN;
DROP TABLE IF EXISTS entries;
DROP TABLE IF EXISTS transactions;
DROP TABLE IF EXISTS accounts;
COMMIT;
";

const BALANCES_BY_ACCOUNT: &str = "
SELECT a.id, COALESCE(s.total, 0)
FROM accounts a
LEFT JOIN (
    SELECT e.account_id, SUM(e.amount) AS total
    FROM entries e
    JOIN transactions t ON t.id = e.transaction_id
    WHERE ?1 IS NULL OR t.date <= ?1
    GROUP BY e.account_id
) s ON s.account_id = a.id
ORDER BY a.id
";

/// Connection settings for the store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long to wait for a lock held by another connection
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Handle to one SQLite ledger database
///
/// Opened once per CLI invocation and passed explicitly to every operation.
/// Outside a [`LoadUnit`] each write is its own atomic transaction.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    location: String,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open(path: &Path, config: &StoreConfig) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::configure(conn, config, path.display().to_string())
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn, &StoreConfig::default(), ":memory:".to_string())
    }

    fn configure(conn: Connection, config: &StoreConfig, location: String) -> Result<Self, StoreError> {
        conn.busy_timeout(config.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn, location })
    }

    /// Database location, for messages
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Whether all ledger tables exist
    pub fn schema_exists(&self) -> Result<bool, StoreError> {
        Ok(self.ledger_table_count()? == 3)
    }

    fn ledger_table_count(&self) -> Result<i64, StoreError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table' AND name IN ('accounts', 'transactions', 'entries')",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn require_schema(&self) -> Result<(), StoreError> {
        if self.schema_exists()? {
            Ok(())
        } else {
            Err(StoreError::schema_missing(&self.location))
        }
    }

    /// Create the ledger tables
    ///
    /// Returns `false` without touching anything if they already exist.
    pub fn create_schema(&self) -> Result<bool, StoreError> {
        if self.schema_exists()? {
            return Ok(false);
        }
        self.conn.execute_batch(SCHEMA)?;
        info!("Created ledger tables in {}", self.location);
        Ok(true)
    }

    /// Drop the ledger tables and everything in them
    ///
    /// Returns `false` if there was nothing to drop.
    pub fn drop_schema(&self) -> Result<bool, StoreError> {
        if self.ledger_table_count()? == 0 {
            return Ok(false);
        }
        self.conn.execute_batch(DROP_SCHEMA)?;
        info!("Dropped ledger tables in {}", self.location);
        Ok(true)
    }

    /// Open the atomic unit of work for one file load
    ///
    /// The unit takes the write lock immediately, so a second concurrent load
    /// waits for the busy timeout and then fails with `ConnectionLost`.
    pub fn begin_load(&mut self) -> Result<LoadUnit<'_>, StoreError> {
        self.require_schema()?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(LoadUnit { tx })
    }

    /// Sum of all committed entry amounts for one account (0 if none)
    pub fn sum_entries_for(&self, account: &AccountId) -> Result<Decimal, StoreError> {
        self.require_schema()?;
        let units: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM entries WHERE account_id = ?1",
            params![account.as_str()],
            |row| row.get(0),
        )?;
        Ok(from_minor_units(units))
    }

    /// Net balance of every known account, ascending by account id
    ///
    /// With `as_of`, only transactions dated on or before that day count.
    pub fn sum_entries_by_account(
        &self,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<(AccountId, Decimal)>, StoreError> {
        self.require_schema()?;
        let as_of = as_of.map(|date| date.format(DATE_FORMAT).to_string());

        let mut stmt = self.conn.prepare(BALANCES_BY_ACCOUNT)?;
        let rows = stmt.query_map(params![as_of], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        rows.map(|row| -> Result<(AccountId, Decimal), StoreError> {
            let (id, units) = row?;
            Ok((AccountId::from_stored(id), from_minor_units(units)))
        })
        .collect()
    }

    /// Entries of a committed transaction, in their original order
    pub fn transaction_entries(&self, id: &TransactionId) -> Result<Vec<Entry>, StoreError> {
        self.require_schema()?;
        let mut stmt = self.conn.prepare(
            "SELECT account_id, amount FROM entries WHERE transaction_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        rows.map(|row| -> Result<Entry, StoreError> {
            let (account, units) = row?;
            Ok(Entry::new(
                AccountId::from_stored(account),
                from_minor_units(units),
            ))
        })
        .collect()
    }
}

impl LedgerWriter for SqliteStore {
    fn ensure_account(&self, id: &AccountId) -> Result<(), StoreError> {
        ensure_account(&self.conn, id)
    }

    fn is_committed(&self, id: &TransactionId) -> Result<bool, StoreError> {
        is_committed(&self.conn, id)
    }

    fn commit_transaction(&self, transaction: &Transaction) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        insert_transaction(&tx, transaction)?;
        tx.commit()?;
        Ok(())
    }
}

/// The single atomic unit wrapping one file load
///
/// Writes are visible to this unit's own lookups (so duplicates within one
/// file are caught) but to nobody else until [`LoadUnit::commit`]. Dropping
/// the unit without committing rolls everything back.
#[derive(Debug)]
pub struct LoadUnit<'conn> {
    tx: rusqlite::Transaction<'conn>,
}

impl LoadUnit<'_> {
    /// Make every staged write durable and visible
    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit()?;
        Ok(())
    }
}

impl LedgerWriter for LoadUnit<'_> {
    fn ensure_account(&self, id: &AccountId) -> Result<(), StoreError> {
        ensure_account(&self.tx, id)
    }

    fn is_committed(&self, id: &TransactionId) -> Result<bool, StoreError> {
        is_committed(&self.tx, id)
    }

    fn commit_transaction(&self, transaction: &Transaction) -> Result<(), StoreError> {
        insert_transaction(&self.tx, transaction)
    }
}

fn ensure_account(conn: &Connection, id: &AccountId) -> Result<(), StoreError> {
    conn.prepare_cached("INSERT OR IGNORE INTO accounts (id) VALUES (?1)")?
        .execute(params![id.as_str()])?;
    Ok(())
}

fn is_committed(conn: &Connection, id: &TransactionId) -> Result<bool, StoreError> {
    let exists = conn
        .prepare_cached("SELECT 1 FROM transactions WHERE id = ?1")?
        .exists(params![id.as_str()])?;
    Ok(exists)
}

fn insert_transaction(conn: &Connection, transaction: &Transaction) -> Result<(), StoreError> {
    conn.prepare_cached(
        "INSERT INTO transactions (id, date, description, source, row_number)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?
    .execute(params![
        transaction.id.as_str(),
        transaction.date.format(DATE_FORMAT).to_string(),
        transaction.description,
        transaction.source,
        transaction.row as i64,
    ])?;

    let mut insert_entry = conn.prepare_cached(
        "INSERT INTO entries (transaction_id, position, account_id, amount)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, entry) in transaction.entries.iter().enumerate() {
        let units = to_minor_units(entry.amount).ok_or_else(|| {
            StoreError::new(
                StoreErrorKind::ConstraintViolation,
                format!(
                    "amount {} of transaction {} has no exact minor-unit representation",
                    entry.amount, transaction.id
                ),
            )
        })?;
        insert_entry.execute(params![
            transaction.id.as_str(),
            position as i64,
            entry.account.as_str(),
            units,
        ])?;
    }

    Ok(())
}
