//! Value conversion from sea-query to `may_postgres`.
//!
//! Converts the `Values` produced by building a sea-query statement into
//! `ToSql` trait objects for execution. Two-pass pattern: first collect all
//! values into typed vectors, then push references to them, so the borrows
//! stay valid for the closure that runs the statement.
//!
//! NULLs are bound through typed `Option`s so the driver sends the correct
//! parameter type for the column.

use chrono::{NaiveDate, NaiveDateTime};
use may_postgres::types::ToSql;
use rust_decimal::Decimal;
use sea_query::Value;

use crate::store::StorageError;

/// Convert sea-query values to `may_postgres` parameters and run `f` with
/// them.
///
/// # Errors
///
/// Returns `StorageError::Other` if a value kind outside this schema's
/// column types shows up, otherwise whatever the closure returns.
pub fn with_converted_params<F, R>(values: &sea_query::Values, f: F) -> Result<R, StorageError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, StorageError>,
{
    let mut bools: Vec<bool> = Vec::new();
    let mut ints: Vec<i32> = Vec::new();
    let mut big_ints: Vec<i64> = Vec::new();
    let mut strings: Vec<String> = Vec::new();
    let mut decimals: Vec<Decimal> = Vec::new();
    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut datetimes: Vec<NaiveDateTime> = Vec::new();

    // Typed NULL placeholders, one per nullable column type we bind
    let null_bool: Option<bool> = None;
    let null_string: Option<String> = None;
    let null_big_int: Option<i64> = None;
    let null_decimal: Option<Decimal> = None;
    let null_date: Option<NaiveDate> = None;
    let null_datetime: Option<NaiveDateTime> = None;

    // First pass: collect owned values
    for value in values.iter() {
        match value {
            Value::Bool(Some(b)) => bools.push(*b),
            Value::Int(Some(i)) => ints.push(*i),
            Value::BigInt(Some(i)) => big_ints.push(*i),
            Value::String(Some(s)) => strings.push(s.clone()),
            Value::Decimal(Some(d)) => decimals.push(*d),
            Value::ChronoDate(Some(d)) => dates.push(*d),
            Value::ChronoDateTime(Some(dt)) => datetimes.push(*dt),
            Value::Bool(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::String(None)
            | Value::Decimal(None)
            | Value::ChronoDate(None)
            | Value::ChronoDateTime(None) => {}
            _ => {
                return Err(StorageError::Other(format!(
                    "Unsupported value type in query: {:?}",
                    value
                )));
            }
        }
    }

    // Second pass: build the parameter slice in order
    let mut bool_idx = 0;
    let mut int_idx = 0;
    let mut big_int_idx = 0;
    let mut string_idx = 0;
    let mut decimal_idx = 0;
    let mut date_idx = 0;
    let mut datetime_idx = 0;

    let mut params: Vec<&dyn ToSql> = Vec::new();

    for value in values.iter() {
        match value {
            Value::Bool(Some(_)) => {
                params.push(&bools[bool_idx] as &dyn ToSql);
                bool_idx += 1;
            }
            Value::Int(Some(_)) => {
                params.push(&ints[int_idx] as &dyn ToSql);
                int_idx += 1;
            }
            Value::BigInt(Some(_)) => {
                params.push(&big_ints[big_int_idx] as &dyn ToSql);
                big_int_idx += 1;
            }
            Value::String(Some(_)) => {
                params.push(&strings[string_idx] as &dyn ToSql);
                string_idx += 1;
            }
            Value::Decimal(Some(_)) => {
                params.push(&decimals[decimal_idx] as &dyn ToSql);
                decimal_idx += 1;
            }
            Value::ChronoDate(Some(_)) => {
                params.push(&dates[date_idx] as &dyn ToSql);
                date_idx += 1;
            }
            Value::ChronoDateTime(Some(_)) => {
                params.push(&datetimes[datetime_idx] as &dyn ToSql);
                datetime_idx += 1;
            }
            Value::String(None) => params.push(&null_string as &dyn ToSql),
            Value::BigInt(None) | Value::Int(None) => {
                params.push(&null_big_int as &dyn ToSql)
            }
            Value::Decimal(None) => params.push(&null_decimal as &dyn ToSql),
            Value::Bool(None) => params.push(&null_bool as &dyn ToSql),
            Value::ChronoDate(None) => params.push(&null_date as &dyn ToSql),
            Value::ChronoDateTime(None) => params.push(&null_datetime as &dyn ToSql),
            _ => {
                return Err(StorageError::Other(format!(
                    "Unsupported value type in query: {:?}",
                    value
                )));
            }
        }
    }

    f(&params)
}
