//! Generic client trait for unified database access.
//!
//! This is the whole contract tinyorm needs from a database: run one statement
//! with positional `?` parameters, then commit or roll back. Connections,
//! drivers and transactions stay outside the crate.

use crate::error::DbError;
use crate::value::Value;
use std::sync::Arc;

/// One result row: values in the same order as [`Cursor::description`].
pub type Row = Vec<Value>;

/// The materialized result of a single statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursor {
    columns: Vec<String>,
    rows: Vec<Row>,
    row_count: u64,
    last_insert_id: Option<i64>,
}

impl Cursor {
    /// A cursor for a statement that returned rows.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len() as u64;
        Self {
            columns,
            rows,
            row_count,
            last_insert_id: None,
        }
    }

    /// A cursor for a statement that only affected rows.
    pub fn affected(row_count: u64, last_insert_id: Option<i64>) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count,
            last_insert_id,
        }
    }

    /// Column names of the result set, in order.
    pub fn description(&self) -> &[String] {
        &self.columns
    }

    /// Returned rows for queries, affected rows for mutations.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Id generated by the last INSERT, if the driver reports one.
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    /// The first row, if any.
    pub fn fetch_one(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl IntoIterator for Cursor {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Cursor {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// A trait that abstracts over database connections.
///
/// Calls block until the driver returns. Implementations are expected to open
/// a transaction implicitly (DB-API style) so that [`GenericClient::commit`] and
/// [`GenericClient::rollback`] always have something to act on.
pub trait GenericClient: Send + Sync {
    /// Execute one statement with positional parameters.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Cursor, DbError>;

    /// Commit the current transaction.
    fn commit(&self) -> Result<(), DbError>;

    /// Roll back the current transaction.
    fn rollback(&self) -> Result<(), DbError>;
}

impl<C: GenericClient + ?Sized> GenericClient for &C {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Cursor, DbError> {
        (**self).execute(sql, params)
    }

    fn commit(&self) -> Result<(), DbError> {
        (**self).commit()
    }

    fn rollback(&self) -> Result<(), DbError> {
        (**self).rollback()
    }
}

impl<C: GenericClient + ?Sized> GenericClient for Arc<C> {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Cursor, DbError> {
        (**self).execute(sql, params)
    }

    fn commit(&self) -> Result<(), DbError> {
        (**self).commit()
    }

    fn rollback(&self) -> Result<(), DbError> {
        (**self).rollback()
    }
}

impl<C: GenericClient + ?Sized> GenericClient for Box<C> {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Cursor, DbError> {
        (**self).execute(sql, params)
    }

    fn commit(&self) -> Result<(), DbError> {
        (**self).commit()
    }

    fn rollback(&self) -> Result<(), DbError> {
        (**self).rollback()
    }
}
