//! SQLite backend built on `rusqlite`.
//!
//! [`SqliteClient`] serializes access to one connection behind a mutex and
//! opens a transaction lazily before each statement, so the commit/rollback
//! calls issued by [`crate::exec::execute`] always have something to act on.
//!
//! ```ignore
//! use std::sync::Arc;
//! use tinyorm::sqlite::SqliteClient;
//!
//! let db = Arc::new(SqliteClient::open_in_memory()?);
//! db.with_connection(|conn| conn.execute_batch("CREATE TABLE user (id INTEGER PRIMARY KEY, name TEXT)"))?;
//! tinyorm::register::<User>(db.clone())?;
//! ```

use crate::client::{Cursor, GenericClient};
use crate::error::DbError;
use crate::monitor::QueryType;
use crate::value::Value;
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Text layout used for `Value::DateTime` parameters.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// How to open a [`SqliteClient`].
#[derive(Debug, Clone, Default)]
pub struct SqliteConfig {
    /// Database file; `None` opens a private in-memory database.
    pub path: Option<PathBuf>,
    /// How long to wait on a locked database before failing.
    pub busy_timeout: Option<Duration>,
}

impl SqliteConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            busy_timeout: None,
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    pub fn open(&self) -> rusqlite::Result<SqliteClient> {
        let conn = match &self.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        Ok(SqliteClient::from_connection(conn))
    }
}

/// A [`GenericClient`] over a single SQLite connection.
pub struct SqliteClient {
    conn: Mutex<Connection>,
}

impl SqliteClient {
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        SqliteConfig::new(path.as_ref()).open()
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        SqliteConfig::in_memory().open()
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run `f` against the raw connection, outside tinyorm's commit handling.
    pub fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> R) -> R {
        f(&self.lock())
    }

    pub fn into_inner(self) -> Connection {
        self.conn.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GenericClient for SqliteClient {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Cursor, DbError> {
        let conn = self.lock();
        if conn.is_autocommit() {
            conn.execute_batch("BEGIN")?;
        }

        let mut stmt = conn.prepare(sql)?;
        if stmt.column_count() == 0 {
            let affected = stmt.execute(params_from_iter(params))?;
            let last_insert_id = (QueryType::from_sql(sql) == QueryType::Insert && affected > 0)
                .then(|| conn.last_insert_rowid());
            return Ok(Cursor::affected(affected as u64, last_insert_id));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(row.get::<_, Value>(i)?);
            }
            out.push(values);
        }
        Ok(Cursor::with_rows(columns, out))
    }

    fn commit(&self) -> Result<(), DbError> {
        let conn = self.lock();
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&self) -> Result<(), DbError> {
        let conn = self.lock();
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Bool(v) => ToSqlOutput::from(*v),
            Value::Int(v) => ToSqlOutput::from(*v),
            Value::Float(v) => ToSqlOutput::from(*v),
            Value::Text(v) => ToSqlOutput::from(v.as_str()),
            Value::Bytes(v) => ToSqlOutput::from(v.as_slice()),
            Value::DateTime(v) => ToSqlOutput::from(v.format(DATETIME_FORMAT).to_string()),
        })
    }
}

/// SQLite has no date type; datetimes read back as `Text`.
impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Int(v),
            ValueRef::Real(v) => Value::Float(v),
            ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => Value::Bytes(v.to_vec()),
        })
    }
}
