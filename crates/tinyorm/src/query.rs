//! Lazy, cached query builder bound to a model.
//!
//! A [`Query`] only accumulates WHERE / ORDER BY / LIMIT state until a
//! terminal operation needs rows. The first fetch runs one SELECT and caches
//! the records; from then on every read (index, slice, length, iteration,
//! default `count()`) is answered from the cache.
//!
//! # Example
//!
//! ```ignore
//! use tinyorm::{Model, fields, values};
//!
//! // LIMIT 0, 10
//! let page = User::filter(fields![name = "John"])?.slice(..10)?;
//!
//! // LIMIT 10, 10
//! let next = User::filter(fields![name = "John"])?.slice(10..20)?;
//!
//! // LIMIT 0, 1
//! let first = User::where_raw("age < ?", values![18])?.order_by("`id` DESC").at(0)?;
//!
//! // SELECT COUNT(distinct(name)) FROM `user` WHERE `name` = ?
//! let n = User::filter(fields![name = "John"])?.count_of("distinct(name)")?;
//! ```
//!
//! # Offsets without a limit
//!
//! The backend has no "offset without limit" form, so a slice with an open end
//! (`q.slice(5..)`) fetches **every** matching row and slices in memory. Be
//! careful with large tables.
//!
//! # Negative indexes
//!
//! `q.at(-1)` runs `SELECT COUNT(0)` first and then fetches row `count - 1`
//! with `LIMIT`. Without an `order_by`, "last" means last in whatever order the
//! database returns rows; no ordering is added implicitly.

use crate::error::{OrmError, OrmResult};
use crate::exec;
use crate::ident::{quote_ident, write_ident};
use crate::model::Model;
use crate::record::Record;
use crate::schema::ModelMeta;
use crate::value::Value;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

/// The LIMIT clause of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// `LIMIT n`
    Offset(u64),
    /// `LIMIT offset, count`
    Window(u64, u64),
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset(n) => write!(f, "LIMIT {n}"),
            Self::Window(offset, count) => write!(f, "LIMIT {offset}, {count}"),
        }
    }
}

/// SELECT builder with a materialized-result cache.
pub struct Query<M> {
    meta: Arc<ModelMeta>,
    operation: String,
    conditions: Vec<String>,
    params: Vec<Value>,
    order_by: Option<String>,
    limit: Option<Limit>,
    cache: Option<Vec<Record<M>>>,
}

impl<M> Query<M> {
    /// `SELECT *` over the model's table.
    pub fn new(meta: Arc<ModelMeta>) -> Self {
        Self {
            meta,
            operation: "SELECT *".to_string(),
            conditions: Vec::new(),
            params: Vec::new(),
            order_by: None,
            limit: None,
            cache: None,
        }
    }

    /// Replace the `SELECT *` prefix (e.g. `SELECT DISTINCT *`).
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    // ==================== WHERE ====================

    /// Append a literal WHERE fragment and its positional parameters.
    ///
    /// The fragment is trusted SQL and is interpolated verbatim.
    pub fn where_raw(
        mut self,
        fragment: impl Into<String>,
        params: impl IntoIterator<Item = Value>,
    ) -> Self {
        self.conditions.push(fragment.into());
        self.params.extend(params);
        self
    }

    /// Add `` `field` = ? ``, or `` `field` IS NULL `` when `value` is `Null`.
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.push_eq(field, value.into());
        self
    }

    /// Apply [`Query::where_eq`] to each pair, in order.
    pub fn filter<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (field, value) in pairs {
            self.push_eq(field.as_ref(), value.into());
        }
        self
    }

    fn push_eq(&mut self, field: &str, value: Value) {
        let mut fragment = quote_ident(field);
        if value.is_null() {
            fragment.push_str(" IS NULL");
        } else {
            fragment.push_str(" = ?");
            self.params.push(value);
        }
        self.conditions.push(fragment);
    }

    // ==================== ORDER BY ====================

    /// Set (or replace) the ORDER BY clause. The clause is trusted SQL.
    pub fn order_by(mut self, clause: impl AsRef<str>) -> Self {
        self.order_by = Some(format!("ORDER BY {}", clause.as_ref()));
        self
    }

    // ==================== Introspection ====================

    pub fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    /// Bound parameters, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// The LIMIT that the next (or last) SELECT uses.
    pub fn limit(&self) -> Option<Limit> {
        self.limit
    }

    /// Whether results have been fetched.
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// `WHERE a AND b ...`, or `None` without conditions.
    pub fn where_clause(&self) -> Option<String> {
        if self.conditions.is_empty() {
            None
        } else {
            Some(format!("WHERE {}", self.conditions.join(" AND ")))
        }
    }

    /// The SELECT statement this query runs.
    pub fn to_sql(&self) -> String {
        let mut sql = self.statement(&self.operation);
        if let Some(order_by) = &self.order_by {
            sql.push(' ');
            sql.push_str(order_by);
        }
        if let Some(limit) = &self.limit {
            sql.push(' ');
            sql.push_str(&limit.to_string());
        }
        sql
    }

    /// `<head> FROM `table` [WHERE ...]`
    fn statement(&self, head: &str) -> String {
        let mut sql = String::with_capacity(64);
        sql.push_str(head);
        sql.push_str(" FROM ");
        write_ident(&mut sql, self.meta.table());
        if let Some(where_clause) = self.where_clause() {
            sql.push(' ');
            sql.push_str(&where_clause);
        }
        sql
    }

    // ==================== Aggregates & mutations ====================

    /// `count_of("0")`.
    pub fn count(&self) -> OrmResult<i64> {
        self.count_of("0")
    }

    /// `SELECT COUNT(<what>)` under the current WHERE.
    ///
    /// For `"0"` and `"*"` a populated cache answers without a round trip.
    /// `what` may be any SQL expression, e.g. `"distinct(name)"`.
    pub fn count_of(&self, what: &str) -> OrmResult<i64> {
        if let Some(cache) = &self.cache {
            if what == "0" || what == "*" {
                return Ok(cache.len() as i64);
            }
        }
        self.count_expr(&format!("COUNT({what})"))
    }

    /// `SELECT COUNT(DISTINCT `column`)` under the current WHERE. Never cached.
    pub fn count_distinct(&self, column: &str) -> OrmResult<i64> {
        self.count_expr(&format!("COUNT(DISTINCT {})", quote_ident(column)))
    }

    fn count_expr(&self, expr: &str) -> OrmResult<i64> {
        let sql = self.statement(&format!("SELECT {expr}"));
        let cursor = exec::execute(self.meta.client(), &sql, &self.params)?;
        let scalar = cursor.fetch_one().and_then(|row| row.first());
        scalar.and_then(scalar_to_i64).ok_or_else(|| {
            let found = scalar.map_or_else(|| "no row".to_string(), Value::to_string);
            OrmError::Serialization(format!("{expr} returned {found}, not an integer (sql: {sql})"))
        })
    }

    /// `DELETE FROM `table` [WHERE ...]`; returns the affected row count.
    ///
    /// The result cache, if any, is left as it is.
    pub fn delete(&self) -> OrmResult<u64> {
        let sql = self.statement("DELETE");
        let cursor = exec::execute(self.meta.client(), &sql, &self.params)?;
        Ok(cursor.row_count())
    }
}

impl<M: Model> Query<M> {
    // ==================== Fetching ====================

    /// Materialize all results (once) and borrow them.
    pub fn records(&mut self) -> OrmResult<&[Record<M>]> {
        let records = match self.cache.take() {
            Some(records) => records,
            None => self.fetch_rows()?,
        };
        Ok(self.cache.insert(records).as_slice())
    }

    /// Materialize all results and take ownership of them.
    pub fn fetch_all(mut self) -> OrmResult<Vec<Record<M>>> {
        self.records()?;
        Ok(self.cache.take().unwrap_or_default())
    }

    /// Iterate over the (materialized) results.
    pub fn iter(&mut self) -> OrmResult<std::slice::Iter<'_, Record<M>>> {
        Ok(self.records()?.iter())
    }

    /// Number of results; materializes the query.
    pub fn len(&mut self) -> OrmResult<usize> {
        Ok(self.records()?.len())
    }

    pub fn is_empty(&mut self) -> OrmResult<bool> {
        Ok(self.records()?.is_empty())
    }

    /// The record at `index`.
    ///
    /// Without a cache this runs `LIMIT index, 1` (and caches that single row).
    /// A negative index is resolved against `count()` first. With a cache the
    /// record is read from it directly.
    pub fn at(&mut self, index: isize) -> OrmResult<Option<Record<M>>> {
        if let Some(cache) = &self.cache {
            return Ok(cached_index(cache, index).cloned());
        }

        let position = if index < 0 {
            self.count()? + index as i64
        } else {
            index as i64
        };
        if position < 0 {
            return Ok(None);
        }

        self.limit = Some(Limit::Window(position as u64, 1));
        Ok(self.records()?.first().cloned())
    }

    /// Shorthand for `at(0)`.
    pub fn first(mut self) -> OrmResult<Option<Record<M>>> {
        self.at(0)
    }

    /// Records in `range`, translated into a LIMIT clause.
    ///
    /// | range        | LIMIT                                  |
    /// |--------------|----------------------------------------|
    /// | `..stop`     | `0, stop`                              |
    /// | `a..b`, a<=b | `a, b - a`                             |
    /// | `a..b`, a>b  | `0` (no rows)                          |
    /// | `a..`, `..`  | none: fetch everything, slice in memory |
    ///
    /// With a cache the range is applied to the cached records instead.
    pub fn slice<R: RangeBounds<usize>>(&mut self, range: R) -> OrmResult<Vec<Record<M>>> {
        let start = match range.start_bound() {
            Bound::Included(&s) => Some(s),
            Bound::Excluded(&s) => Some(s.saturating_add(1)),
            Bound::Unbounded => None,
        };
        let stop = match range.end_bound() {
            Bound::Included(&e) => Some(e.saturating_add(1)),
            Bound::Excluded(&e) => Some(e),
            Bound::Unbounded => None,
        };

        if let Some(cache) = &self.cache {
            return Ok(cached_slice(cache, start, stop).to_vec());
        }

        let Some(stop) = stop else {
            self.limit = None;
            let all = self.records()?;
            return Ok(cached_slice(all, start, None).to_vec());
        };
        self.limit = Some(match start {
            None => Limit::Window(0, stop as u64),
            Some(start) if start <= stop => Limit::Window(start as u64, (stop - start) as u64),
            Some(_) => Limit::Offset(0),
        });
        Ok(self.records()?.to_vec())
    }

    fn fetch_rows(&self) -> OrmResult<Vec<Record<M>>> {
        let sql = self.to_sql();
        let cursor = exec::execute(self.meta.client(), &sql, &self.params)?;
        Ok(cursor
            .into_iter()
            .map(|row| Record::from_row(Arc::clone(&self.meta), row))
            .collect())
    }
}

impl<M> fmt::Debug for Query<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("sql", &self.to_sql())
            .field("params", &self.params)
            .field("cached", &self.cache.as_ref().map(Vec::len))
            .finish()
    }
}

fn cached_index<T>(items: &[T], index: isize) -> Option<&T> {
    let position = if index < 0 {
        items.len().checked_sub(index.unsigned_abs())?
    } else {
        index as usize
    };
    items.get(position)
}

fn cached_slice<T>(items: &[T], start: Option<usize>, stop: Option<usize>) -> &[T] {
    let len = items.len();
    let start = start.unwrap_or(0).min(len);
    let stop = stop.unwrap_or(len).min(len);
    if start >= stop {
        &[]
    } else {
        &items[start..stop]
    }
}

/// Integer-valued scalars only; some drivers hand back counts as text or floats.
fn scalar_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
        Value::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
