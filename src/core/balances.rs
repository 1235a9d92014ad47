//! Balance aggregation
//!
//! Balances are never stored. They are computed from committed entries on
//! every call, so they always reflect exactly the committed loads.

use crate::core::store::SqliteStore;
use crate::types::{AccountId, Balances, StoreError};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Net balance of every known account
///
/// Accounts whose entries cancel out are reported with a zero balance.
pub fn get_balances(store: &SqliteStore) -> Result<Balances, StoreError> {
    Ok(store.sum_entries_by_account(None)?.into_iter().collect())
}

/// Net balance of every known account counting only transactions dated on or
/// before `end_date`
pub fn get_balances_as_of(store: &SqliteStore, end_date: NaiveDate) -> Result<Balances, StoreError> {
    Ok(store
        .sum_entries_by_account(Some(end_date))?
        .into_iter()
        .collect())
}

/// Net balance of one account; zero for an account with no entries
pub fn get_balance(store: &SqliteStore, account: &AccountId) -> Result<Decimal, StoreError> {
    store.sum_entries_for(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::LedgerWriter;
    use crate::types::{Entry, StoreErrorKind, Transaction, TransactionId};
    use std::str::FromStr;

    fn account(id: &str) -> AccountId {
        AccountId::new(id).unwrap()
    }

    fn record(store: &SqliteStore, id: &str, date: (i32, u32, u32), debit: &str, credit: &str, amount: &str) {
        let amount = Decimal::from_str(amount).unwrap();
        let tx = Transaction {
            id: TransactionId::new(id).unwrap(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            description: String::new(),
            source: "balances".to_string(),
            row: 1,
            entries: vec![
                Entry::new(account(debit), amount),
                Entry::new(account(credit), -amount),
            ],
        };
        for a in tx.accounts() {
            store.ensure_account(a).unwrap();
        }
        store.commit_transaction(&tx).unwrap();
    }

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_schema().unwrap();
        store
    }

    #[test]
    fn test_balances_sum_to_zero() {
        let store = store();
        record(&store, "t1", (2024, 1, 1), "cash", "equity", "1000");
        record(&store, "t2", (2024, 1, 5), "rent", "cash", "750.1234");
        record(&store, "t3", (2024, 2, 1), "cash", "sales", "0.0001");

        let balances = get_balances(&store).unwrap();

        assert_eq!(balances.len(), 4);
        assert_eq!(balances[&account("cash")], Decimal::from_str("249.8767").unwrap());
        assert!(balances.values().sum::<Decimal>().is_zero());
        let order: Vec<&str> = balances.keys().map(AccountId::as_str).collect();
        assert_eq!(order, vec!["cash", "equity", "rent", "sales"]);
    }

    #[test]
    fn test_zero_net_account_is_reported() {
        let store = store();
        record(&store, "t1", (2024, 1, 1), "A", "B", "5");
        record(&store, "t2", (2024, 1, 2), "B", "A", "5");

        let balances = get_balances(&store).unwrap();

        assert_eq!(balances[&account("A")], Decimal::ZERO);
        assert_eq!(balances[&account("B")], Decimal::ZERO);
    }

    #[test]
    fn test_balances_as_of_includes_end_date() {
        let store = store();
        record(&store, "t1", (2024, 1, 1), "A", "B", "1");
        record(&store, "t2", (2024, 1, 31), "A", "B", "2");
        record(&store, "t3", (2024, 2, 1), "A", "B", "4");

        let end_date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let balances = get_balances_as_of(&store, end_date).unwrap();

        assert_eq!(balances[&account("A")], Decimal::from(3));
        assert_eq!(get_balances(&store).unwrap()[&account("A")], Decimal::from(7));
    }

    #[test]
    fn test_get_balance_for_unknown_account_is_zero() {
        let store = store();
        record(&store, "t1", (2024, 1, 1), "A", "B", "1");

        assert_eq!(get_balance(&store, &account("A")).unwrap(), Decimal::ONE);
        assert_eq!(get_balance(&store, &account("Z")).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_empty_ledger_and_missing_schema() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(
            get_balances(&store).unwrap_err().kind,
            StoreErrorKind::SchemaMissing
        );

        store.create_schema().unwrap();
        assert!(get_balances(&store).unwrap().is_empty());
    }
}
