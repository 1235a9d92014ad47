//! Ingestion coordinator
//!
//! This module turns a stream of parsed transactions into one all-or-nothing
//! load. A [`LoadSession`] owns the store's [`LoadUnit`] for the duration of
//! a file:
//!
//! ```text
//! row ──► duplicate lookup ──► validator ──► ensure accounts ──► stage
//!                                                                  │
//!                         first error: drop unit (rollback) ◄──────┤
//!                         end of file: commit unit          ◄──────┘
//! ```
//!
//! Rows staged earlier in the same load are visible to later duplicate
//! lookups, so an id repeated within one file is rejected like one that was
//! committed by an earlier load.

use crate::core::store::{LoadUnit, SqliteStore};
use crate::core::traits::LedgerWriter;
use crate::core::validator;
use crate::strategy::LoadStrategy;
use crate::types::{LoadError, LoadSummary, Transaction};
use log::{debug, info, warn};
use std::path::Path;

/// One in-progress file load
///
/// Nothing staged through a session is visible outside it until
/// [`LoadSession::finish`] succeeds. Dropping the session (including on an
/// early `?` return) rolls the whole load back.
pub struct LoadSession<'conn> {
    unit: LoadUnit<'conn>,
    summary: LoadSummary,
}

impl<'conn> LoadSession<'conn> {
    /// Open the atomic unit for a load of `source`
    ///
    /// # Errors
    ///
    /// * `LoadError::StoreFailed` with `SchemaMissing` if the ledger tables do not exist
    /// * `LoadError::StoreFailed` with `ConnectionLost` if another load holds the write lock
    pub fn begin(store: &'conn mut SqliteStore, source: &str) -> Result<Self, LoadError> {
        info!("Loading {} into {}", source, store.location());
        let unit = store.begin_load()?;

        Ok(Self {
            unit,
            summary: LoadSummary::new(source),
        })
    }

    /// Validate one transaction and stage it into the unit
    ///
    /// # Arguments
    ///
    /// * `transaction` - The parsed row
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the row was staged
    /// * `Err(LoadError)` carrying the row number if it was rejected; the
    ///   session must then be dropped
    pub fn stage(&mut self, transaction: Transaction) -> Result<(), LoadError> {
        let already_committed = self.unit.is_committed(&transaction.id)?;
        validator::validate(&transaction, already_committed)
            .map_err(|e| LoadError::validation_failed(transaction.row, e))?;

        for account in transaction.accounts() {
            self.unit.ensure_account(account)?;
        }
        self.unit.commit_transaction(&transaction)?;

        debug!(
            "Staged transaction {} from row {} ({} entries)",
            transaction.id,
            transaction.row,
            transaction.entries.len()
        );

        self.summary.rows_loaded += 1;
        self.summary
            .accounts_touched
            .extend(transaction.accounts().cloned());
        self.summary.transaction_ids.push(transaction.id);
        Ok(())
    }

    /// Number of rows staged so far
    pub fn rows_staged(&self) -> u64 {
        self.summary.rows_loaded
    }

    /// Commit every staged row and return the summary
    pub fn finish(self) -> Result<LoadSummary, LoadError> {
        self.unit.commit()?;
        info!("{}", self.summary);
        Ok(self.summary)
    }
}

/// Load one CSV file as a single atomic unit
///
/// Either every row of the file is committed, or (on the first parse,
/// validation or store failure) none is and the error names the row.
///
/// # Arguments
///
/// * `store` - Open store with the ledger schema in place
/// * `path` - CSV file to load
/// * `strategy` - How the file is read and parsed
pub fn load_file(
    store: &mut SqliteStore,
    path: &Path,
    strategy: &dyn LoadStrategy,
) -> Result<LoadSummary, LoadError> {
    strategy.load(store, path).inspect_err(|e| {
        warn!("Load of {} rolled back: {}", path.display(), e);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::balances::{get_balance, get_balances};
    use crate::io::SourceFile;
    use crate::strategy::{AsyncLoadStrategy, BatchConfig, SyncLoadStrategy};
    use crate::types::{
        AccountId, ParseErrorKind, StoreErrorKind, TransactionId, ValidationErrorKind,
    };
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::fs;
    use std::str::FromStr;
    use tempfile::TempDir;

    const HEADER: &str = "date,account,amount,counter_account,description\n";

    struct Fixture {
        _dir: TempDir,
        dir_path: std::path::PathBuf,
        store: SqliteStore,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let store = SqliteStore::open_in_memory().unwrap();
            store.create_schema().unwrap();
            Fixture {
                dir_path: dir.path().to_path_buf(),
                _dir: dir,
                store,
            }
        }

        fn write(&self, name: &str, content: &str) -> std::path::PathBuf {
            let path = self.dir_path.join(name);
            fs::write(&path, content).unwrap();
            path
        }
    }

    fn strategy(name: &str) -> Box<dyn LoadStrategy> {
        match name {
            "sync" => Box::new(SyncLoadStrategy),
            _ => Box::new(AsyncLoadStrategy::new(BatchConfig::new(2, 2))),
        }
    }

    fn account(id: &str) -> AccountId {
        AccountId::new(id).unwrap()
    }

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[rstest]
    #[case::sync("sync")]
    #[case::async_strategy("async")]
    fn test_load_balanced_file(#[case] name: &str) {
        let mut fixture = Fixture::new();
        let path = fixture.write(
            "ledger.csv",
            &format!(
                "{}2024-01-01,A,100,B,rent\n2024-01-02,B,25.5,C,refund\n",
                HEADER
            ),
        );

        let summary = load_file(&mut fixture.store, &path, strategy(name).as_ref()).unwrap();

        assert_eq!(summary.rows_loaded, 2);
        assert_eq!(summary.accounts_touched.len(), 3);
        let fingerprint = SourceFile::read(&path).unwrap().fingerprint;
        assert_eq!(
            summary.transaction_ids,
            vec![
                TransactionId::derived(&fingerprint, 1),
                TransactionId::derived(&fingerprint, 2)
            ]
        );
        let balances = get_balances(&fixture.store).unwrap();
        assert_eq!(balances[&account("A")], dec("100"));
        assert_eq!(balances[&account("B")], dec("-74.5"));
        assert_eq!(balances[&account("C")], dec("-25.5"));
        assert!(balances.values().sum::<Decimal>().is_zero());
    }

    #[rstest]
    #[case::sync("sync")]
    #[case::async_strategy("async")]
    fn test_unbalanced_row_rolls_back_whole_file(#[case] name: &str) {
        let mut fixture = Fixture::new();
        let path = fixture.write(
            "mixed.csv",
            "date,account,amount,counter_account,counter_amount\n\
             2024-01-01,A,10,B,10\n\
             2024-01-02,A,50,B,30\n\
             2024-01-03,A,5,B,5\n",
        );

        let error = load_file(&mut fixture.store, &path, strategy(name).as_ref()).unwrap_err();

        match error {
            LoadError::ValidationFailed { row, error } => {
                assert_eq!(row, 2);
                assert_eq!(error.kind, ValidationErrorKind::Unbalanced);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(get_balances(&fixture.store).unwrap().is_empty());
    }

    #[rstest]
    #[case::sync("sync")]
    #[case::async_strategy("async")]
    fn test_malformed_amount_reports_row(#[case] name: &str) {
        let mut fixture = Fixture::new();
        let path = fixture.write(
            "bad.csv",
            &format!(
                "{}2024-01-01,A,1,B,ok\n2024-01-02,A,1,B,ok\n2024-01-03,A,abc,B,bad\n",
                HEADER
            ),
        );

        let error = load_file(&mut fixture.store, &path, strategy(name).as_ref()).unwrap_err();

        match error {
            LoadError::ParseFailed(e) => {
                assert_eq!(e.row, 3);
                assert_eq!(e.kind, ParseErrorKind::MalformedAmount);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(get_balance(&fixture.store, &account("A")).unwrap(), Decimal::ZERO);
    }

    #[rstest]
    #[case::sync("sync")]
    #[case::async_strategy("async")]
    fn test_reloading_same_file_is_duplicate(#[case] name: &str) {
        let mut fixture = Fixture::new();
        let path = fixture.write("ledger.csv", &format!("{}2024-01-01,A,1,B,x\n", HEADER));
        let strategy = strategy(name);

        load_file(&mut fixture.store, &path, strategy.as_ref()).unwrap();
        let error = load_file(&mut fixture.store, &path, strategy.as_ref()).unwrap_err();

        match error {
            LoadError::ValidationFailed { row, error } => {
                assert_eq!(row, 1);
                assert_eq!(error.kind, ValidationErrorKind::DuplicateTransaction);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(get_balance(&fixture.store, &account("A")).unwrap(), Decimal::ONE);
    }

    #[rstest]
    #[case::sync("sync")]
    #[case::async_strategy("async")]
    fn test_same_file_name_in_different_directories(#[case] name: &str) {
        let mut fixture = Fixture::new();
        fs::create_dir(fixture.dir_path.join("jan")).unwrap();
        fs::create_dir(fixture.dir_path.join("feb")).unwrap();
        let jan = fixture.write(
            "jan/export.csv",
            &format!("{}2024-01-05,A,10,B,jan\n", HEADER),
        );
        let feb = fixture.write(
            "feb/export.csv",
            &format!("{}2024-02-05,A,20,B,feb\n", HEADER),
        );
        let strategy = strategy(name);

        let first = load_file(&mut fixture.store, &jan, strategy.as_ref()).unwrap();
        let second = load_file(&mut fixture.store, &feb, strategy.as_ref()).unwrap();

        assert_eq!(first.source, second.source);
        assert_ne!(first.transaction_ids, second.transaction_ids);
        assert_eq!(get_balance(&fixture.store, &account("A")).unwrap(), dec("30"));

        // The same bytes under another path are still a reload
        let copy = fixture.write(
            "copy.csv",
            &format!("{}2024-01-05,A,10,B,jan\n", HEADER),
        );
        let error = load_file(&mut fixture.store, &copy, strategy.as_ref()).unwrap_err();
        match error {
            LoadError::ValidationFailed { row, error } => {
                assert_eq!(row, 1);
                assert_eq!(error.kind, ValidationErrorKind::DuplicateTransaction);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(get_balance(&fixture.store, &account("A")).unwrap(), dec("30"));
    }

    #[rstest]
    #[case::sync("sync")]
    #[case::async_strategy("async")]
    fn test_every_committed_transaction_nets_to_zero(#[case] name: &str) {
        let mut fixture = Fixture::new();
        let path = fixture.write(
            "spread.csv",
            "date,account,amount,counter_account,counter_amount\n\
             2024-01-01,A,100,B,100\n\
             2024-01-02,B,-12.3456,C,-12.3456\n\
             2024-01-03,C,0.0001,A,\n\
             2024-01-04,D,7,A,7\n\
             2024-01-05,A,3,D,3\n",
        );

        let summary = load_file(&mut fixture.store, &path, strategy(name).as_ref()).unwrap();

        assert_eq!(summary.transaction_ids.len(), 5);
        for id in &summary.transaction_ids {
            let entries = fixture.store.transaction_entries(id).unwrap();
            assert_eq!(entries.len(), 2, "{}", id);
            let net: Decimal = entries.iter().map(|entry| entry.amount).sum();
            assert!(net.is_zero(), "{} nets to {}", id, net);
        }
        assert!(fixture
            .store
            .transaction_entries(&TransactionId::derived("0000000000000000", 1))
            .unwrap()
            .is_empty());
    }

    #[rstest]
    #[case::sync("sync")]
    #[case::async_strategy("async")]
    fn test_duplicate_id_within_file(#[case] name: &str) {
        let mut fixture = Fixture::new();
        let path = fixture.write(
            "ids.csv",
            "id,date,account,amount,counter_account\n\
             t1,2024-01-01,A,1,B\n\
             t2,2024-01-01,A,1,B\n\
             t1,2024-01-02,A,1,B\n",
        );

        let error = load_file(&mut fixture.store, &path, strategy(name).as_ref()).unwrap_err();

        assert_eq!(error.row(), Some(3));
        assert!(get_balances(&fixture.store).unwrap().is_empty());
    }

    #[rstest]
    #[case::sync("sync")]
    #[case::async_strategy("async")]
    fn test_empty_file_commits_nothing(#[case] name: &str) {
        let mut fixture = Fixture::new();
        let path = fixture.write("empty.csv", HEADER);

        let summary = load_file(&mut fixture.store, &path, strategy(name).as_ref()).unwrap();

        assert_eq!(summary.rows_loaded, 0);
        assert!(get_balances(&fixture.store).unwrap().is_empty());
    }

    #[rstest]
    #[case::sync("sync")]
    #[case::async_strategy("async")]
    fn test_missing_file(#[case] name: &str) {
        let mut fixture = Fixture::new();
        let path = fixture.dir_path.join("nope.csv");

        let error = load_file(&mut fixture.store, &path, strategy(name).as_ref()).unwrap_err();

        assert!(matches!(error, LoadError::FileNotFound { .. }));
    }

    #[rstest]
    #[case::sync("sync")]
    #[case::async_strategy("async")]
    fn test_load_requires_schema(#[case] name: &str) {
        let mut fixture = Fixture::new();
        fixture.store.drop_schema().unwrap();
        let path = fixture.write("ledger.csv", &format!("{}2024-01-01,A,1,B,x\n", HEADER));

        let error = load_file(&mut fixture.store, &path, strategy(name).as_ref()).unwrap_err();

        match error {
            LoadError::StoreFailed(e) => assert_eq!(e.kind, StoreErrorKind::SchemaMissing),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_session_dropped_without_finish_rolls_back() {
        let mut fixture = Fixture::new();
        let path = fixture.write("ledger.csv", &format!("{}2024-01-01,A,1,B,x\n", HEADER));
        {
            let mut session = LoadSession::begin(&mut fixture.store, "ledger.csv").unwrap();
            for transaction in crate::io::SyncReader::open(&path).unwrap() {
                session.stage(transaction.unwrap()).unwrap();
            }
            assert_eq!(session.rows_staged(), 1);
        }

        assert!(get_balances(&fixture.store).unwrap().is_empty());
    }
}
