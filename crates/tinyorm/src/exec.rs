//! Statement execution with commit/rollback semantics.
//!
//! Every statement tinyorm issues goes through [`execute`]: the SQL and its
//! parameters are logged, the transaction is committed on success and rolled
//! back on failure. Consecutive statements are *not* grouped into one
//! transaction.
//!
//! # Example
//!
//! ```ignore
//! use tinyorm::raw;
//!
//! let cursor = raw("SELECT * FROM `user` WHERE `id` = ?")
//!     .bind(1)
//!     .execute(&client)?;
//! ```

use crate::client::{Cursor, GenericClient, Row};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// Execute one statement, committing on success and rolling back on failure.
pub fn execute<C>(client: &C, sql: &str, params: &[Value]) -> OrmResult<Cursor>
where
    C: GenericClient + ?Sized,
{
    tracing::debug!(target: "tinyorm.sql", sql, params = ?params, "executing statement");

    match client.execute(sql, params) {
        Ok(cursor) => {
            if let Err(err) = client.commit() {
                tracing::error!(target: "tinyorm.sql", sql, error = %err, "commit failed");
                rollback_quietly(client);
                return Err(OrmError::Commit(err));
            }
            Ok(cursor)
        }
        Err(err) => {
            tracing::error!(
                target: "tinyorm.sql",
                sql,
                params = ?params,
                error = %err,
                "statement failed"
            );
            rollback_quietly(client);
            Err(OrmError::query_execution(sql, err))
        }
    }
}

fn rollback_quietly<C: GenericClient + ?Sized>(client: &C) {
    if let Err(err) = client.rollback() {
        tracing::error!(target: "tinyorm.sql", error = %err, "rollback failed");
    }
}

/// Hand-written SQL with positional parameters.
#[derive(Debug, Clone)]
pub struct RawQuery {
    sql: String,
    params: Vec<Value>,
}

/// Start a hand-written statement.
pub fn raw(sql: impl Into<String>) -> RawQuery {
    RawQuery {
        sql: sql.into(),
        params: Vec::new(),
    }
}

impl RawQuery {
    /// Bind the next `?` parameter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Bind several parameters in order.
    pub fn bind_all(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.params.extend(values);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Execute and return the cursor.
    pub fn execute<C: GenericClient + ?Sized>(&self, client: &C) -> OrmResult<Cursor> {
        execute(client, &self.sql, &self.params)
    }

    /// Execute and return all rows.
    pub fn fetch_all<C: GenericClient + ?Sized>(&self, client: &C) -> OrmResult<Vec<Row>> {
        Ok(self.execute(client)?.into_rows())
    }

    /// Execute and return the first row, if any.
    pub fn fetch_opt<C: GenericClient + ?Sized>(&self, client: &C) -> OrmResult<Option<Row>> {
        Ok(self.execute(client)?.into_iter().next())
    }
}
