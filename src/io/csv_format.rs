//! CSV format handling for ledger rows and balance output
//!
//! This module centralizes all CSV format concerns, providing:
//! - `ColumnSchema`, resolved once from the header row
//! - `RawRow`, an untyped row as it comes off either reader
//! - The record parser turning a raw row into a [`Transaction`]
//! - Balance output serialization
//!
//! All functions are pure (no I/O besides the output writer) for easy testing.
//!
//! # Column Schema
//!
//! ```text
//! date,account,amount,counter_account[,counter_amount][,description][,id]
//! ```
//!
//! Each row is one transaction with two entries: `+amount` on `account` and
//! `-counter_amount` on `counter_account` (`counter_amount` defaults to
//! `amount`). Column order is free; names are matched case-insensitively.

use crate::io::SourceFile;
use crate::types::{
    to_minor_units, AccountId, Balances, CommandError, Entry, ParseError, ParseErrorKind,
    Transaction, TransactionId, AMOUNT_SCALE,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;

/// Date format accepted in the `date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const COL_DATE: &str = "date";
const COL_ACCOUNT: &str = "account";
const COL_AMOUNT: &str = "amount";
const COL_COUNTER_ACCOUNT: &str = "counter_account";
const COL_COUNTER_AMOUNT: &str = "counter_amount";
const COL_DESCRIPTION: &str = "description";
const COL_ID: &str = "id";

/// One CSV data row as an ordered sequence of fields
///
/// `row` is the 1-based data row number (the header is not counted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row: u64,
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn new(row: u64, fields: Vec<String>) -> Self {
        RawRow { row, fields }
    }
}

/// Field positions resolved from the header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    date: usize,
    account: usize,
    amount: usize,
    counter_account: usize,
    counter_amount: Option<usize>,
    description: Option<usize>,
    id: Option<usize>,
    width: usize,
}

impl ColumnSchema {
    /// Resolve column positions from a header row
    ///
    /// # Errors
    ///
    /// Returns a `MissingColumn` error at row 0 if a required column is absent.
    pub fn from_headers<I, S>(headers: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = headers
            .into_iter()
            .map(|name| name.as_ref().trim().to_lowercase())
            .collect();

        let position = |column: &str| names.iter().position(|name| name == column);
        let required = |column: &str| {
            position(column).ok_or_else(|| {
                ParseError::new(
                    0,
                    ParseErrorKind::MissingColumn,
                    format!("header has no '{}' column", column),
                )
            })
        };

        Ok(ColumnSchema {
            date: required(COL_DATE)?,
            account: required(COL_ACCOUNT)?,
            amount: required(COL_AMOUNT)?,
            counter_account: required(COL_COUNTER_ACCOUNT)?,
            counter_amount: position(COL_COUNTER_AMOUNT),
            description: position(COL_DESCRIPTION),
            id: position(COL_ID),
            width: names.len(),
        })
    }
}

/// Parse one raw row into a transaction
///
/// A row with more fields than the header is rejected as `MalformedRow`.
/// Fields are then checked in column order: date, account, amount,
/// counter account, counter amount. The first failure is returned.
///
/// # Arguments
///
/// * `schema` - Column positions resolved from the header
/// * `raw` - The row to parse
/// * `source` - Input file; its fingerprint derives the transaction id when the row has none
pub fn parse_row(
    schema: &ColumnSchema,
    raw: &RawRow,
    source: &SourceFile,
) -> Result<Transaction, ParseError> {
    let row = raw.row;

    if raw.fields.len() > schema.width {
        return Err(ParseError::new(
            row,
            ParseErrorKind::MalformedRow,
            format!(
                "row has {} fields but the header has {}",
                raw.fields.len(),
                schema.width
            ),
        ));
    }

    let date = parse_date(row, required_field(raw, schema.date, COL_DATE)?)?;
    let account = parse_account(
        row,
        COL_ACCOUNT,
        required_field(raw, schema.account, COL_ACCOUNT)?,
    )?;
    let amount = parse_amount(
        row,
        COL_AMOUNT,
        required_field(raw, schema.amount, COL_AMOUNT)?,
    )?;
    let counter_account = parse_account(
        row,
        COL_COUNTER_ACCOUNT,
        required_field(raw, schema.counter_account, COL_COUNTER_ACCOUNT)?,
    )?;
    let counter_amount = match optional_field(raw, schema.counter_amount) {
        Some(value) => parse_amount(row, COL_COUNTER_AMOUNT, value)?,
        None => amount,
    };

    let id = optional_field(raw, schema.id)
        .and_then(TransactionId::new)
        .unwrap_or_else(|| TransactionId::derived(&source.fingerprint, row));
    let description = optional_field(raw, schema.description)
        .unwrap_or_default()
        .to_string();

    Ok(Transaction {
        id,
        date,
        description,
        source: source.name.clone(),
        row,
        entries: vec![
            Entry::new(account, amount),
            Entry::new(counter_account, -counter_amount),
        ],
    })
}

fn required_field<'a>(raw: &'a RawRow, index: usize, column: &str) -> Result<&'a str, ParseError> {
    raw.fields
        .get(index)
        .map(|value| value.trim())
        .ok_or_else(|| {
            ParseError::new(
                raw.row,
                ParseErrorKind::MissingColumn,
                format!("row has no '{}' column", column),
            )
        })
}

fn optional_field(raw: &RawRow, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|index| raw.fields.get(index))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn parse_date(row: u64, value: &str) -> Result<NaiveDate, ParseError> {
    if value.is_empty() {
        return Err(ParseError::new(
            row,
            ParseErrorKind::MissingColumn,
            format!("'{}' is empty", COL_DATE),
        ));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        ParseError::new(
            row,
            ParseErrorKind::MalformedDate,
            format!("'{}' is not a YYYY-MM-DD date", value),
        )
    })
}

fn parse_account(row: u64, column: &str, value: &str) -> Result<AccountId, ParseError> {
    AccountId::new(value).ok_or_else(|| {
        ParseError::new(
            row,
            ParseErrorKind::EmptyAccount,
            format!("'{}' is blank", column),
        )
    })
}

fn parse_amount(row: u64, column: &str, value: &str) -> Result<Decimal, ParseError> {
    if value.is_empty() {
        return Err(ParseError::new(
            row,
            ParseErrorKind::MissingColumn,
            format!("'{}' is empty", column),
        ));
    }
    let not_a_decimal = || {
        ParseError::new(
            row,
            ParseErrorKind::MalformedAmount,
            format!("'{}' in '{}' is not a decimal", value, column),
        )
    };
    if !is_plain_decimal(value) {
        return Err(not_a_decimal());
    }
    let amount = Decimal::from_str(value).map_err(|_| not_a_decimal())?;
    if to_minor_units(amount).is_none() {
        return Err(ParseError::new(
            row,
            ParseErrorKind::MalformedAmount,
            format!(
                "'{}' in '{}' needs more than {} decimal places or is out of range",
                value, column, AMOUNT_SCALE
            ),
        ));
    }
    Ok(amount)
}

/// `[+-]digits[.digits]`, with digits on at least one side of the point
///
/// `Decimal::from_str` also takes `_` separators, which a ledger file must not use.
fn is_plain_decimal(value: &str) -> bool {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    (!whole.is_empty() || !fraction.is_empty()) && all_digits(whole) && all_digits(fraction)
}

/// One line of balance output
#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    account: &'a str,
    balance: String,
}

/// Write balances in CSV format
///
/// Writes `account,balance` rows in the map's order (ascending account id),
/// with amounts at four decimal places. The header is always written, even
/// for an empty ledger.
pub fn write_balances_csv(balances: &Balances, output: &mut dyn Write) -> Result<(), CommandError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    writer.write_record(["account", "balance"])?;

    for (account, amount) in balances {
        writer.serialize(BalanceRow {
            account: account.as_str(),
            balance: format!("{:.4}", amount),
        })?;
    }

    writer.flush()?;

    Ok(())
}
