//! Scripted in-memory client for unit tests.

use crate::client::{Cursor, GenericClient};
use crate::error::DbError;
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A statement seen by [`ScriptedClient`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Executed {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Answers schema probes with a fixed column list and everything else from a
/// queue of scripted responses (an empty cursor once the queue runs dry).
#[derive(Default)]
pub(crate) struct ScriptedClient {
    columns: Vec<String>,
    responses: Mutex<VecDeque<Result<Cursor, String>>>,
    log: Mutex<Vec<Executed>>,
    commits: Mutex<usize>,
    rollbacks: Mutex<usize>,
}

impl ScriptedClient {
    pub fn new(columns: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        })
    }

    /// Queue rows for the next non-probe statement.
    pub fn push_rows(&self, rows: Vec<Vec<Value>>) {
        let cursor = Cursor::with_rows(self.columns.clone(), rows);
        self.responses.lock().unwrap().push_back(Ok(cursor));
    }

    pub fn push_cursor(&self, cursor: Cursor) {
        self.responses.lock().unwrap().push_back(Ok(cursor));
    }

    pub fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    /// Queue a single-cell result, as returned by `SELECT COUNT(..)`.
    pub fn push_scalar(&self, value: impl Into<Value>) {
        let cursor = Cursor::with_rows(vec!["COUNT".into()], vec![vec![value.into()]]);
        self.push_cursor(cursor);
    }

    /// Drain the statement log.
    pub fn take_log(&self) -> Vec<Executed> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }

    /// Drain the log, keeping only the SQL text.
    pub fn take_sql(&self) -> Vec<String> {
        self.take_log().into_iter().map(|e| e.sql).collect()
    }

    pub fn commits(&self) -> usize {
        *self.commits.lock().unwrap()
    }

    pub fn rollbacks(&self) -> usize {
        *self.rollbacks.lock().unwrap()
    }
}

impl GenericClient for ScriptedClient {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Cursor, DbError> {
        self.log.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        if sql.starts_with("SELECT * FROM") && sql.ends_with("LIMIT 0") {
            return Ok(Cursor::with_rows(self.columns.clone(), Vec::new()));
        }

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(cursor)) => Ok(cursor),
            Some(Err(message)) => Err(message.into()),
            None => Ok(Cursor::with_rows(self.columns.clone(), Vec::new())),
        }
    }

    fn commit(&self) -> Result<(), DbError> {
        *self.commits.lock().unwrap() += 1;
        Ok(())
    }

    fn rollback(&self) -> Result<(), DbError> {
        *self.rollbacks.lock().unwrap() += 1;
        Ok(())
    }
}
